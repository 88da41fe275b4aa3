//! Anthropic HTTP backend.
//!
//! Second-priority provider, speaking the Messages API. The API has no
//! JSON-object response mode, so a request carrying a response schema gets a
//! system-prompt instruction to emit a single JSON object; validation happens
//! in the orchestrating client.

use crate::http_client::HttpClient;
use crate::types::{GenerationRequest, GenerationResponse, ProviderAdapter};
use async_trait::async_trait;
use gtmforge_config::GtmConfig;
use gtmforge_utils::error::{ConfigError, ProviderError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const JSON_ONLY_INSTRUCTION: &str =
    "Respond with a single valid JSON object and nothing else. No prose, no code fences.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct HttpParams {
    max_tokens: u32,
    temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

pub struct AnthropicBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl AnthropicBackend {
    fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, ConfigError> {
        let client = HttpClient::new()?;
        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            default_params,
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` if the API key variable is unset.
    pub fn new_from_config(config: &GtmConfig) -> Result<Self, ConfigError> {
        let section = config.llm.anthropic.as_ref();

        let api_key_env = section
            .and_then(|c| c.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV);

        let api_key = std::env::var(api_key_env).map_err(|_| ConfigError::MissingEnv {
            var: api_key_env.to_string(),
            purpose: "Anthropic API key".to_string(),
        })?;

        let base_url = section.and_then(|c| c.base_url.clone());
        let default_model = section
            .and_then(|c| c.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let default_params = HttpParams {
            max_tokens: section
                .and_then(|c| c.max_tokens)
                .unwrap_or_else(|| HttpParams::default().max_tokens),
            temperature: section
                .and_then(|c| c.temperature)
                .unwrap_or_else(|| HttpParams::default().temperature),
        };

        Self::new(api_key, base_url, default_model, default_params)
    }

    fn resolve_params(&self, request: &GenerationRequest) -> (String, HttpParams) {
        let model = request
            .parameters
            .get("model")
            .and_then(|v| v.as_str())
            .map_or_else(|| self.default_model.clone(), str::to_string);

        let max_tokens = request
            .parameters
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .map_or(self.default_params.max_tokens, |v| v as u32);

        let temperature = request
            .parameters
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map_or(self.default_params.temperature, |v| v as f32);

        (
            model,
            HttpParams {
                max_tokens,
                temperature,
            },
        )
    }

    /// Assemble the system prompt: caller-supplied system text first, then
    /// the JSON-only instruction when a schema is requested.
    fn build_system(request: &GenerationRequest) -> Option<String> {
        let caller_system = request
            .parameters
            .get("system")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        match (caller_system, request.response_schema.is_some()) {
            (Some(system), true) => Some(format!("{system}\n\n{JSON_ONLY_INSTRUCTION}")),
            (Some(system), false) => Some(system),
            (None, true) => Some(JSON_ONLY_INSTRUCTION.to_string()),
            (None, false) => None,
        }
    }

    async fn send(
        &self,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<GenerationResponse, ProviderError> {
        let (model, params) = self.resolve_params(request);

        debug!(
            provider = "anthropic",
            model = %model,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            structured = request.response_schema.is_some(),
            "Invoking Anthropic backend"
        );

        let request_body = AnthropicRequest {
            model: model.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system: Self::build_system(request),
        };

        let http_request = self
            .client
            .inner()
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(http_request, timeout, "anthropic")
            .await?;

        let response_body: AnthropicResponse = response.json().await.map_err(|e| {
            ProviderError::Transport(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let text: String = response_body
            .content
            .iter()
            .filter(|b| b.content_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        let mut result = GenerationResponse::new(text, model, "anthropic");
        if let Some(usage) = response_body.usage {
            let mut map = HashMap::new();
            map.insert(
                "input_tokens".to_string(),
                serde_json::json!(usage.input_tokens),
            );
            map.insert(
                "output_tokens".to_string(),
                serde_json::json!(usage.output_tokens),
            );
            result.usage = Some(map);
        }

        debug!(provider = "anthropic", "Anthropic invocation completed");
        Ok(result)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn priority(&self) -> u32 {
        2
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        self.send(request, REQUEST_TIMEOUT).await
    }

    async fn health_check(&self) -> bool {
        let probe = GenerationRequest::new("ping").with_parameter(
            "max_tokens",
            serde_json::json!(1),
        );
        self.send(&probe, HEALTH_CHECK_TIMEOUT).await.is_ok()
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_backend(base_url: String) -> AnthropicBackend {
        AnthropicBackend::new(
            "test-key".to_string(),
            Some(base_url),
            DEFAULT_MODEL.to_string(),
            HttpParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn build_system_appends_json_instruction_for_schemas() {
        let request = GenerationRequest::new("hello")
            .with_parameter("system", serde_json::json!("Be brief."))
            .with_schema(serde_json::json!({"type": "object"}));

        let system = AnthropicBackend::build_system(&request).unwrap();
        assert!(system.starts_with("Be brief."));
        assert!(system.contains("single valid JSON object"));
    }

    #[test]
    fn build_system_absent_without_system_or_schema() {
        let request = GenerationRequest::new("hello");
        assert!(AnthropicBackend::build_system(&request).is_none());
    }

    #[test]
    fn new_from_config_missing_api_key() {
        let test_env_var = "ANTHROPIC_API_KEY_TEST_MISSING";
        unsafe {
            std::env::remove_var(test_env_var);
        }

        let mut config = GtmConfig::minimal_for_testing();
        config.llm.anthropic = Some(gtmforge_config::AnthropicConfig {
            api_key_env: Some(test_env_var.to_string()),
            base_url: None,
            model: None,
            max_tokens: None,
            temperature: None,
        });

        match AnthropicBackend::new_from_config(&config) {
            Err(ConfigError::MissingEnv { var, .. }) => assert_eq!(var, test_env_var),
            Err(other) => panic!("expected MissingEnv, got {other:?}"),
            Ok(_) => panic!("expected MissingEnv, got a backend"),
        }
    }

    #[tokio::test]
    async fn generate_concatenates_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "text", "text": "{\"a\":"},
                    {"type": "text", "text": " 1}"}
                ],
                "usage": {"input_tokens": 12, "output_tokens": 4}
            })))
            .mount(&server)
            .await;

        let backend = test_backend(server.uri());
        let response = backend
            .generate(&GenerationRequest::new("describe"))
            .await
            .unwrap();
        assert_eq!(response.text, "{\"a\": 1}");
        assert_eq!(response.provider, "anthropic");
        let usage = response.usage.unwrap();
        assert_eq!(usage.get("input_tokens"), Some(&serde_json::json!(12)));
    }

    #[tokio::test]
    async fn missing_text_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{"type": "tool_use", "text": null}]
            })))
            .mount(&server)
            .await;

        let backend = test_backend(server.uri());
        let result = backend.generate(&GenerationRequest::new("describe")).await;
        assert!(matches!(result, Err(ProviderError::EmptyResponse)));
    }
}
