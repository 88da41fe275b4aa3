//! LLM provider orchestration for gtmforge.
//!
//! Concrete HTTP backends implement the [`ProviderAdapter`] trait; the
//! [`LlmClient`] runs them through a priority-ordered failover loop with one
//! circuit breaker per provider. Structured output is extracted, normalized,
//! and schema-validated before it reaches callers.

mod anthropic_backend;
mod breaker;
mod client;
mod gemini_backend;
pub(crate) mod http_client;
mod openai_backend;
mod structured;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use anthropic_backend::AnthropicBackend;
pub use breaker::{BreakerState, BreakerStatus, CircuitBreaker};
pub use client::LlmClient;
pub use gemini_backend::GeminiBackend;
pub use gtmforge_utils::error::{LlmClientError, ProviderError};
pub use openai_backend::OpenAiBackend;
pub use types::{GenerationRequest, GenerationResponse, ProviderAdapter};

use gtmforge_config::GtmConfig;
use gtmforge_utils::error::ConfigError;
use std::sync::Arc;

/// Build an [`LlmClient`] with one adapter per configured provider block.
///
/// OpenAI and Anthropic fail fast here when their credentials are missing; a
/// Gemini block always registers, disabled when no key is present.
///
/// # Errors
///
/// Returns `ConfigError` when a configured provider cannot be constructed.
pub fn client_from_config(config: &GtmConfig) -> Result<LlmClient, ConfigError> {
    let client = LlmClient::new(config.llm.breaker);

    if config.llm.openai.is_some() {
        client.register_provider(Arc::new(OpenAiBackend::new_from_config(config)?));
    }
    if config.llm.anthropic.is_some() {
        client.register_provider(Arc::new(AnthropicBackend::new_from_config(config)?));
    }
    if config.llm.gemini.is_some() {
        client.register_provider(Arc::new(GeminiBackend::new_from_config(config)));
    }

    Ok(client)
}

#[cfg(test)]
mod factory_tests {
    use super::*;

    #[test]
    fn empty_config_builds_client_with_no_providers() {
        let config = GtmConfig::minimal_for_testing();
        let client = client_from_config(&config).unwrap();
        assert!(client.provider_names().is_empty());
    }

    #[test]
    fn missing_openai_key_fails_construction() {
        let test_env_var = "OPENAI_API_KEY_FACTORY_TEST";
        unsafe {
            std::env::remove_var(test_env_var);
        }

        let mut config = GtmConfig::minimal_for_testing();
        config.llm.openai = Some(gtmforge_config::OpenAiConfig {
            api_key_env: Some(test_env_var.to_string()),
            base_url: None,
            model: None,
            max_tokens: None,
            temperature: None,
        });

        let result = client_from_config(&config);
        assert!(matches!(result, Err(ConfigError::MissingEnv { .. })));
    }

    #[test]
    fn gemini_block_registers_even_without_key() {
        let test_env_var = "GEMINI_API_KEY_FACTORY_TEST";
        unsafe {
            std::env::remove_var(test_env_var);
        }

        let mut config = GtmConfig::minimal_for_testing();
        config.llm.gemini = Some(gtmforge_config::GeminiConfig {
            api_key_env: Some(test_env_var.to_string()),
            base_url: None,
            model: None,
        });

        let client = client_from_config(&config).unwrap();
        assert_eq!(client.provider_names(), vec!["gemini"]);
    }
}
