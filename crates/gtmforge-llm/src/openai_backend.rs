//! OpenAI HTTP backend.
//!
//! First-priority provider, speaking the chat-completions API. When the
//! request carries a response schema the backend asks for
//! `response_format = {"type": "json_object"}`; schema enforcement itself
//! happens in the orchestrating client after the text comes back.

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

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4.1-nano";
const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-call HTTP parameters with backend defaults.
#[derive(Debug, Clone)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

pub struct OpenAiBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl OpenAiBackend {
    pub(crate) fn new(
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

    /// Build the backend from configuration, loading the API key from the
    /// environment at construction time.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` if the API key variable is unset —
    /// the backend fails here rather than lazily on the first call.
    pub fn new_from_config(config: &GtmConfig) -> Result<Self, ConfigError> {
        let section = config.llm.openai.as_ref();

        let api_key_env = section
            .and_then(|c| c.api_key_env.as_deref())
            .unwrap_or(DEFAULT_API_KEY_ENV);

        let api_key = std::env::var(api_key_env).map_err(|_| ConfigError::MissingEnv {
            var: api_key_env.to_string(),
            purpose: "OpenAI API key".to_string(),
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

    /// Resolve per-call parameters: request parameters override backend
    /// defaults, unspecified values fall back.
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

    fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if let Some(system) = request.parameters.get("system").and_then(|v| v.as_str()) {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });
        messages
    }

    async fn send(
        &self,
        request: &GenerationRequest,
        timeout: Duration,
    ) -> Result<GenerationResponse, ProviderError> {
        let (model, params) = self.resolve_params(request);

        debug!(
            provider = "openai",
            model = %model,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            structured = request.response_schema.is_some(),
            "Invoking OpenAI backend"
        );

        let request_body = ChatRequest {
            model: model.clone(),
            messages: Self::build_messages(request),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            response_format: request
                .response_schema
                .as_ref()
                .map(|_| ResponseFormat {
                    format_type: "json_object".to_string(),
                }),
        };

        let http_request = self
            .client
            .inner()
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(http_request, timeout, "openai")
            .await?;

        let response_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(format!("Failed to parse OpenAI response: {e}")))?;

        let text = response_body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        let mut result = GenerationResponse::new(text, response_body.model, "openai");
        if let Some(usage) = response_body.usage {
            result.usage = Some(usage);
        }

        debug!(provider = "openai", "OpenAI invocation completed");
        Ok(result)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn priority(&self) -> u32 {
        1
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
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
