//! Gemini backend placeholder.
//!
//! Registered at the lowest priority so the provider table and breaker map
//! carry its slot, but the backend itself is permanently disabled: `generate`
//! always reports `NotConfigured` and `health_check` is always false. The
//! adapter records whether a key was present at construction purely for
//! logging.

use crate::types::{GenerationRequest, GenerationResponse, ProviderAdapter};
use async_trait::async_trait;
use gtmforge_config::GtmConfig;
use gtmforge_utils::error::ProviderError;
use tracing::{debug, warn};

const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct GeminiBackend {
    key_present: bool,
}

impl GeminiBackend {
    /// Construction never fails: a missing key leaves the backend disabled
    /// instead of erroring, unlike the other providers.
    #[must_use]
    pub fn new_from_config(config: &GtmConfig) -> Self {
        let api_key_env = config
            .llm
            .gemini
            .as_ref()
            .and_then(|c| c.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV);

        let key_present = std::env::var(api_key_env).is_ok();
        if !key_present {
            warn!(
                var = api_key_env,
                "Gemini API key not set; provider registered disabled"
            );
        }

        Self { key_present }
    }

    #[must_use]
    pub fn key_present(&self) -> bool {
        self.key_present
    }
}

#[async_trait]
impl ProviderAdapter for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn priority(&self) -> u32 {
        3
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        debug!(provider = "gemini", "Skipping disabled Gemini backend");
        Err(ProviderError::NotConfigured("gemini".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}
