//! Core types for the provider adapter abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use gtmforge_utils::error::ProviderError;

/// Input to a single generation call.
///
/// Immutable for the duration of the call: the orchestrating client hands the
/// same request to each adapter it tries, so adapters must not mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// User prompt text.
    pub prompt: String,
    /// Provider-tunable parameters. Recognized keys: `model`, `max_tokens`,
    /// `temperature`, and `system` (a system prompt, honored by backends that
    /// support one). Unknown keys are ignored.
    pub parameters: HashMap<String, serde_json::Value>,
    /// When present, the adapter asks its backend for JSON output. The schema
    /// itself is enforced after the fact by the orchestrating client, not by
    /// the backend.
    pub response_schema: Option<serde_json::Value>,
}

impl GenerationRequest {
    /// Create a request with no parameters and no schema.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            parameters: HashMap::new(),
            response_schema: None,
        }
    }

    /// Attach a response schema.
    #[must_use]
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Set a provider parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}

/// Output of a successful generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Raw response text from the backend.
    pub text: String,
    /// Model that actually served the request.
    pub model: String,
    /// Backend-reported usage accounting, when available.
    pub usage: Option<HashMap<String, serde_json::Value>>,
    /// Stable name of the provider that produced the response.
    pub provider: String,
}

impl GenerationResponse {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        model: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            usage: None,
            provider: provider.into(),
        }
    }
}

/// Trait implemented by every concrete backend.
///
/// Adapters own their transport concerns (timeouts, retry of transient HTTP
/// failures); the orchestrating client owns failover and circuit breaking.
/// Adapters are registered once and held for the process lifetime.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider name, used as the circuit breaker key and in logs.
    fn name(&self) -> &str;

    /// Failover priority; lower values are tried first. Ties keep
    /// registration order.
    fn priority(&self) -> u32;

    /// Execute one generation call.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` for any failure: transport, auth, backend
    /// status, or an empty response. The error feeds the provider's circuit
    /// breaker and triggers failover.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError>;

    /// Cheap liveness probe. Never errors; any failure is `false`.
    async fn health_check(&self) -> bool;
}
