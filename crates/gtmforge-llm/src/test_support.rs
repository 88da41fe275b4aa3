//! Scripted provider for exercising the failover loop without a network.
//!
//! Available to dependent crates through the `test-support` feature.

use crate::types::{GenerationRequest, GenerationResponse, ProviderAdapter};
use async_trait::async_trait;
use gtmforge_utils::error::ProviderError;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A provider that replays a scripted sequence of outcomes.
///
/// Each `generate` call consumes the next scripted outcome; an exhausted
/// script fails with a transport error so a test that under-scripts fails
/// loudly instead of hanging on a default.
pub struct ScriptedProvider {
    name: String,
    priority: u32,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    calls: AtomicUsize,
    healthy: bool,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            priority,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            healthy: true,
        }
    }

    /// Queue a successful response with the given text.
    #[must_use]
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Ok(text.into()));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_failure(self, error: ProviderError) -> Self {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Err(error));
        self
    }

    /// Report `healthy` from `health_check`.
    #[must_use]
    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    /// Number of `generate` calls observed so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .expect("script lock poisoned")
            .pop_front();
        match next {
            Some(Ok(text)) => Ok(GenerationResponse::new(text, "scripted-model", &self.name)),
            Some(Err(e)) => Err(e),
            None => Err(ProviderError::Transport(format!(
                "scripted provider '{}' exhausted",
                self.name
            ))),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}
