//! LLM-backed context assessment.
//!
//! Used by the generic resolution path when no deterministic predicate
//! applies: the model summarizes what the context supports, and readiness is
//! judged from that summary.

use async_trait::async_trait;
use gtmforge_llm::{GenerationRequest, LlmClient, LlmClientError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Outcome of assessing a piece of context.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Assessment {
    #[serde(default)]
    pub company_overview: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl Assessment {
    /// Ready means the context supported a non-empty overview and at least
    /// one capability.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.company_overview.trim().is_empty() && !self.capabilities.is_empty()
    }
}

/// Assessment seam, so the resolver can be exercised without an LLM.
#[async_trait]
pub trait ContextAssessor: Send + Sync {
    /// Assess raw context text.
    ///
    /// # Errors
    ///
    /// Returns `LlmClientError` when the backing model cannot be reached or
    /// returns malformed output.
    async fn assess(&self, content: &str) -> Result<Assessment, LlmClientError>;
}

/// Assessor backed by the failover LLM client.
pub struct LlmContextAssessor {
    client: Arc<LlmClient>,
}

impl LlmContextAssessor {
    #[must_use]
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }

    fn response_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["company_overview", "capabilities"],
            "properties": {
                "company_overview": {"type": "string"},
                "capabilities": {"type": "array", "items": {"type": "string"}},
                "notes": {"type": "string"}
            }
        })
    }
}

#[async_trait]
impl ContextAssessor for LlmContextAssessor {
    async fn assess(&self, content: &str) -> Result<Assessment, LlmClientError> {
        // Empty context never warrants a model call.
        if content.trim().is_empty() {
            debug!("Skipping assessment of empty context");
            return Ok(Assessment::default());
        }

        let rendered = gtmforge_prompt::render("context_assessment", &json!({"context": content}))
            .map_err(|e| LlmClientError::MalformedOutput {
                reason: format!("assessment prompt failed to render: {e}"),
                raw: String::new(),
                fields: Vec::new(),
            })?;

        let mut request =
            GenerationRequest::new(rendered.user).with_schema(Self::response_schema());
        if let Some(system) = rendered.system {
            request = request.with_parameter("system", json!(system));
        }

        self.client.generate_structured_as(request).await
    }
}
