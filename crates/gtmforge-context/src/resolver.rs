//! Context resolution: pick the best available context for an artifact.
//!
//! Three strategies share one resolver. Target-account and target-persona
//! resolution are deterministic (pure sufficiency predicates, scraped content
//! trusted as-is); the generic path runs every candidate through an LLM
//! assessment. Scrape failures are data here, not errors: a path that cannot
//! find context yields a not-ready envelope.

use crate::assess::ContextAssessor;
use crate::sufficiency::{
    ensure_object, is_company_context_sufficient, is_target_persona_context_sufficient,
};
use gtmforge_llm::LlmClientError;
use gtmforge_scrape::{ExtractedContent, WebsiteExtractor};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which resolution strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Company context checked with the company predicate, else website
    /// content trusted as-is.
    TargetAccount,
    /// User then company context checked with the full persona predicate,
    /// else website content trusted as-is.
    TargetPersona,
    /// User then company context judged by LLM assessment, else website
    /// content judged the same way.
    Assessed,
}

/// Where the resolved context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    UserContext,
    CompanyContext,
    Website,
}

impl std::fmt::Display for ContextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextSource::UserContext => write!(f, "user_context"),
            ContextSource::CompanyContext => write!(f, "company_context"),
            ContextSource::Website => write!(f, "website"),
        }
    }
}

/// Inputs available for resolution.
#[derive(Debug, Clone, Default)]
pub struct ContextRequest {
    pub user_context: Option<Value>,
    pub company_context: Option<Value>,
    pub website_url: Option<String>,
}

/// Resolution outcome.
///
/// `is_ready == true` implies `context` carries a non-empty payload.
/// `from_cache` is populated only for website-sourced context, directly from
/// the extractor's explicit cache signal.
#[derive(Debug, Clone)]
pub struct ContextEnvelope {
    pub source: Option<ContextSource>,
    pub context: Value,
    pub is_ready: bool,
    pub html: Option<String>,
    pub from_cache: Option<bool>,
}

impl ContextEnvelope {
    fn not_ready() -> Self {
        Self {
            source: None,
            context: Value::Null,
            is_ready: false,
            html: None,
            from_cache: None,
        }
    }

    fn ready(source: ContextSource, context: Value) -> Self {
        Self {
            source: Some(source),
            context,
            is_ready: true,
            html: None,
            from_cache: None,
        }
    }

    fn from_website(content: ExtractedContent, is_ready: bool) -> Self {
        Self {
            source: Some(ContextSource::Website),
            context: Value::String(content.content),
            is_ready,
            html: content.html,
            from_cache: Some(content.from_cache),
        }
    }
}

pub struct ContextResolver {
    extractor: Arc<dyn WebsiteExtractor>,
    assessor: Arc<dyn ContextAssessor>,
}

impl ContextResolver {
    #[must_use]
    pub fn new(extractor: Arc<dyn WebsiteExtractor>, assessor: Arc<dyn ContextAssessor>) -> Self {
        Self {
            extractor,
            assessor,
        }
    }

    /// Resolve the best context for the given strategy.
    ///
    /// # Errors
    ///
    /// Only the assessed path can fail, with `LlmClientError` from the
    /// assessment call. Missing or unusable context is never an error: it
    /// yields a not-ready envelope.
    pub async fn resolve(
        &self,
        request: &ContextRequest,
        mode: ResolutionMode,
    ) -> Result<ContextEnvelope, LlmClientError> {
        match mode {
            ResolutionMode::TargetAccount => Ok(self.resolve_target_account(request).await),
            ResolutionMode::TargetPersona => Ok(self.resolve_target_persona(request).await),
            ResolutionMode::Assessed => self.resolve_assessed(request).await,
        }
    }

    async fn resolve_target_account(&self, request: &ContextRequest) -> ContextEnvelope {
        if let Some(company_ctx) = non_empty_context(request.company_context.as_ref()) {
            if is_company_context_sufficient(&company_ctx) {
                info!(source = "company_context", "Company context sufficient for target account");
                return ContextEnvelope::ready(ContextSource::CompanyContext, company_ctx);
            }
            debug!("Company context insufficient for target account, considering website");
        }

        self.website_trusted(request).await
    }

    async fn resolve_target_persona(&self, request: &ContextRequest) -> ContextEnvelope {
        let candidates = [
            (ContextSource::UserContext, request.user_context.as_ref()),
            (ContextSource::CompanyContext, request.company_context.as_ref()),
        ];
        for (source, context) in candidates {
            if let Some(ctx) = non_empty_context(context)
                && is_target_persona_context_sufficient(&ctx)
            {
                info!(source = %source, "Context sufficient for target persona");
                return ContextEnvelope::ready(source, ctx);
            }
        }

        self.website_trusted(request).await
    }

    async fn resolve_assessed(
        &self,
        request: &ContextRequest,
    ) -> Result<ContextEnvelope, LlmClientError> {
        let candidates = [
            (ContextSource::UserContext, request.user_context.as_ref()),
            (ContextSource::CompanyContext, request.company_context.as_ref()),
        ];
        for (source, context) in candidates {
            let Some(ctx) = context.filter(|c| !c.is_null()) else {
                continue;
            };
            let content = context_as_text(ctx);
            if content.trim().is_empty() {
                continue;
            }
            let assessment = self.assessor.assess(&content).await?;
            if assessment.is_ready() {
                info!(source = %source, "Assessed context is ready");
                return Ok(ContextEnvelope::ready(source, ctx.clone()));
            }
            debug!(source = %source, "Assessed context not ready, trying next source");
        }

        let Some(content) = self.scrape_with_fallback(request).await else {
            return Ok(ContextEnvelope::not_ready());
        };

        // The assessed path reports whatever readiness the assessment finds,
        // ready or not.
        let assessment = self.assessor.assess(&content.content).await?;
        Ok(ContextEnvelope::from_website(content, assessment.is_ready()))
    }

    /// Website path for the deterministic strategies: scraped content is
    /// trusted without assessment.
    async fn website_trusted(&self, request: &ContextRequest) -> ContextEnvelope {
        match self.scrape_with_fallback(request).await {
            Some(content) => {
                info!(
                    url = %content.url,
                    from_cache = content.from_cache,
                    "Using website content as context"
                );
                ContextEnvelope::from_website(content, true)
            }
            None => {
                warn!("No sufficient context and no usable website content");
                ContextEnvelope::not_ready()
            }
        }
    }

    /// One direct fetch; on error or empty content, one crawl retry. Both
    /// failing means no content is available.
    async fn scrape_with_fallback(&self, request: &ContextRequest) -> Option<ExtractedContent> {
        let url = request.website_url.as_deref()?;

        match self.extractor.extract(url, false).await {
            Ok(content) if !content.content.trim().is_empty() => return Some(content),
            Ok(_) => debug!(url, "Direct fetch returned no content, retrying with crawl"),
            Err(e) => warn!(url, error = %e, "Direct fetch failed, retrying with crawl"),
        }

        match self.extractor.extract(url, true).await {
            Ok(content) if !content.content.trim().is_empty() => Some(content),
            Ok(_) => {
                warn!(url, "Crawl also returned no content");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "Crawl also failed");
                None
            }
        }
    }
}

fn non_empty_context(context: Option<&Value>) -> Option<Value> {
    let ctx = context?;
    match ctx {
        Value::Object(map) if !map.is_empty() => Some(ctx.clone()),
        Value::Array(items) if !items.is_empty() => Some(ctx.clone()),
        Value::String(_) => {
            let parsed = ensure_object(ctx);
            if parsed.is_empty() {
                None
            } else {
                Some(Value::Object(parsed))
            }
        }
        _ => None,
    }
}

fn context_as_text(context: &Value) -> String {
    match context {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
