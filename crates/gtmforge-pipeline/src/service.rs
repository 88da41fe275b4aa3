//! The analysis service: one request/response cycle per artifact type.
//!
//! Each generation follows the same shape: resolve context, optionally
//! preprocess it, render the artifact's prompt, call the failover client with
//! the artifact's response schema, deserialize. A not-ready envelope stops
//! the cycle with `InsufficientContext` before any model call is made.

use crate::artifacts::{CompanyOverviewResult, TargetAccountProfile, TargetPersonaProfile};
use crate::preprocess::PreprocessingPipeline;
use gtmforge_context::{ContextEnvelope, ContextRequest, ContextResolver, ResolutionMode};
use gtmforge_llm::{GenerationRequest, LlmClient};
use gtmforge_prompt::RenderedPrompt;
use gtmforge_scrape::WebsiteExtractor;
use gtmforge_utils::error::PipelineError;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

/// Inputs for one artifact generation.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub website_url: Option<String>,
    pub user_context: Option<Value>,
    pub company_context: Option<Value>,
    pub account_context: Option<Value>,
    /// Caller-suggested name for the generated profile.
    pub profile_name: Option<String>,
    /// Free-text steer from the caller, rendered into the prompt verbatim.
    pub hypothesis: Option<String>,
}

impl AnalysisRequest {
    fn context_request(&self) -> ContextRequest {
        ContextRequest {
            user_context: self.user_context.clone(),
            company_context: self.company_context.clone(),
            website_url: self.website_url.clone(),
        }
    }
}

pub struct AnalysisService {
    client: Arc<LlmClient>,
    resolver: ContextResolver,
    extractor: Arc<dyn WebsiteExtractor>,
    preprocessing: Option<PreprocessingPipeline>,
}

impl AnalysisService {
    #[must_use]
    pub fn new(
        client: Arc<LlmClient>,
        resolver: ContextResolver,
        extractor: Arc<dyn WebsiteExtractor>,
    ) -> Self {
        Self {
            client,
            resolver,
            extractor,
            preprocessing: None,
        }
    }

    /// Enable content preprocessing for website-sourced context.
    #[must_use]
    pub fn with_preprocessing(mut self, pipeline: PreprocessingPipeline) -> Self {
        self.preprocessing = Some(pipeline);
        self
    }

    /// Generate a company overview from website content.
    ///
    /// This path scrapes directly instead of going through resolution: the
    /// overview is always derived from the live site, so there is nothing to
    /// assess.
    ///
    /// # Errors
    ///
    /// `InsufficientContext` when no URL was given or the site yields no
    /// content; otherwise LLM and prompt errors.
    pub async fn generate_company_overview(
        &self,
        request: &AnalysisRequest,
    ) -> Result<CompanyOverviewResult, PipelineError> {
        let Some(url) = request.website_url.as_deref() else {
            return Err(PipelineError::InsufficientContext {
                artifact: "company_overview".to_string(),
                source_tag: None,
            });
        };

        let Some(content) = self.fetch_with_fallback(url).await else {
            return Err(PipelineError::InsufficientContext {
                artifact: "company_overview".to_string(),
                source_tag: Some("website".to_string()),
            });
        };

        let website_content = match &self.preprocessing {
            Some(pipeline) => pipeline.process(&content.content, content.html.as_deref()),
            None => content.content.clone(),
        };

        info!(
            url = %content.url,
            from_cache = content.from_cache,
            "Generating company overview"
        );
        let rendered = gtmforge_prompt::render(
            "company_overview",
            &json!({
                "website_url": content.url,
                "website_content": website_content
            }),
        )?;

        self.generate_artifact(rendered, CompanyOverviewResult::response_schema())
            .await
    }

    /// Generate a target-account profile.
    ///
    /// # Errors
    ///
    /// `InsufficientContext` when resolution finds no usable context;
    /// otherwise LLM and prompt errors.
    pub async fn generate_target_account(
        &self,
        request: &AnalysisRequest,
    ) -> Result<TargetAccountProfile, PipelineError> {
        let envelope = self
            .resolver
            .resolve(&request.context_request(), ResolutionMode::TargetAccount)
            .await?;
        let context = self.ready_context("target_account", envelope)?;

        let rendered = gtmforge_prompt::render(
            "target_account",
            &json!({
                "account_profile_name": request.profile_name.as_deref().unwrap_or(""),
                "company_context": context,
                "hypothesis": request.hypothesis.as_deref().unwrap_or("")
            }),
        )?;

        self.generate_artifact(rendered, TargetAccountProfile::response_schema())
            .await
    }

    /// Generate a target-persona profile.
    ///
    /// # Errors
    ///
    /// `InsufficientContext` when resolution finds no usable context;
    /// otherwise LLM and prompt errors.
    pub async fn generate_target_persona(
        &self,
        request: &AnalysisRequest,
    ) -> Result<TargetPersonaProfile, PipelineError> {
        let envelope = self
            .resolver
            .resolve(&request.context_request(), ResolutionMode::TargetPersona)
            .await?;
        let context = self.ready_context("target_persona", envelope)?;

        let account_context = request
            .account_context
            .as_ref()
            .map(context_to_text)
            .unwrap_or_default();

        let rendered = gtmforge_prompt::render(
            "target_persona",
            &json!({
                "persona_profile_name": request.profile_name.as_deref().unwrap_or(""),
                "company_context": context,
                "account_context": account_context,
                "hypothesis": request.hypothesis.as_deref().unwrap_or("")
            }),
        )?;

        self.generate_artifact(rendered, TargetPersonaProfile::response_schema())
            .await
    }

    /// Turn a resolution envelope into prompt-ready context text, rejecting
    /// not-ready envelopes.
    fn ready_context(
        &self,
        artifact: &str,
        envelope: ContextEnvelope,
    ) -> Result<String, PipelineError> {
        if !envelope.is_ready {
            warn!(artifact, "Resolution found no sufficient context");
            return Err(PipelineError::InsufficientContext {
                artifact: artifact.to_string(),
                source_tag: envelope.source.map(|s| s.to_string()),
            });
        }

        // Website-sourced context goes through preprocessing when enabled;
        // structured context is rendered as-is.
        let text = match (&self.preprocessing, &envelope.context) {
            (Some(pipeline), Value::String(content)) => {
                pipeline.process(content, envelope.html.as_deref())
            }
            (_, value) => context_to_text(value),
        };
        Ok(text)
    }

    async fn generate_artifact<T: serde::de::DeserializeOwned>(
        &self,
        rendered: RenderedPrompt,
        schema: Value,
    ) -> Result<T, PipelineError> {
        let mut generation = GenerationRequest::new(rendered.user).with_schema(schema);
        if let Some(system) = rendered.system {
            generation = generation.with_parameter("system", json!(system));
        }
        Ok(self.client.generate_structured_as(generation).await?)
    }

    /// Direct fetch with a single crawl retry, mirroring the resolver's
    /// website fallback.
    async fn fetch_with_fallback(&self, url: &str) -> Option<gtmforge_scrape::ExtractedContent> {
        match self.extractor.extract(url, false).await {
            Ok(content) if !content.content.trim().is_empty() => return Some(content),
            Ok(_) => warn!(url, "Direct fetch returned no content, retrying with crawl"),
            Err(e) => warn!(url, error = %e, "Direct fetch failed, retrying with crawl"),
        }

        match self.extractor.extract(url, true).await {
            Ok(content) if !content.content.trim().is_empty() => Some(content),
            _ => None,
        }
    }
}

fn context_to_text(context: &Value) -> String {
    match context {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gtmforge_config::BreakerSettings;
    use gtmforge_context::{ContextAssessor, LlmContextAssessor};
    use gtmforge_llm::test_support::ScriptedProvider;
    use gtmforge_scrape::ExtractedContent;
    use gtmforge_utils::error::ScrapeError;

    struct FixedExtractor {
        content: Option<String>,
    }

    #[async_trait]
    impl WebsiteExtractor for FixedExtractor {
        async fn extract(&self, url: &str, _crawl: bool) -> Result<ExtractedContent, ScrapeError> {
            match &self.content {
                Some(content) => Ok(ExtractedContent {
                    url: url.to_string(),
                    content: content.clone(),
                    html: None,
                    from_cache: false,
                }),
                None => Err(ScrapeError::ContentUnavailable {
                    url: url.to_string(),
                }),
            }
        }
    }

    fn overview_json() -> String {
        serde_json::to_string(&json!({
            "company_name": "Acme",
            "company_url": "https://acme.example",
            "description": "Forges anvils.",
            "business_profile": {
                "category": "forging",
                "business_model": "B2B"
            },
            "capabilities": ["forging"],
            "positioning": {
                "key_market_belief": "durability wins",
                "unique_approach": "custom alloys"
            },
            "icp_hypothesis": {
                "target_account_hypothesis": "manufacturers",
                "target_persona_hypothesis": "ops leads"
            },
            "data_quality_metrics": {
                "content_completeness": 0.9,
                "information_specificity": 0.8,
                "data_recency": 0.5,
                "marketing_maturity": 0.4
            }
        }))
        .unwrap()
    }

    fn account_json() -> String {
        serde_json::to_string(&json!({
            "target_account_name": "Mid-market manufacturers",
            "target_account_description": "Manufacturers with in-house forging",
            "firmographics": {"industry": ["Manufacturing"]},
            "data_quality_metrics": {
                "content_completeness": 0.7,
                "information_specificity": 0.6,
                "data_recency": 0.5,
                "marketing_maturity": 0.4
            }
        }))
        .unwrap()
    }

    fn service_with(
        responses: Vec<String>,
        site_content: Option<&str>,
    ) -> AnalysisService {
        let mut provider = ScriptedProvider::new("openai", 1);
        for response in responses {
            provider = provider.with_response(response);
        }
        let client = LlmClient::new(BreakerSettings::default());
        client.register_provider(Arc::new(provider));
        let client = Arc::new(client);

        let extractor: Arc<dyn WebsiteExtractor> = Arc::new(FixedExtractor {
            content: site_content.map(str::to_string),
        });
        let assessor: Arc<dyn ContextAssessor> =
            Arc::new(LlmContextAssessor::new(Arc::clone(&client)));
        let resolver = ContextResolver::new(Arc::clone(&extractor), assessor);

        AnalysisService::new(client, resolver, extractor)
    }

    #[tokio::test]
    async fn company_overview_from_website() {
        let service = service_with(vec![overview_json()], Some("We forge anvils."));
        let request = AnalysisRequest {
            website_url: Some("acme.example".to_string()),
            ..AnalysisRequest::default()
        };

        let overview = service.generate_company_overview(&request).await.unwrap();
        assert_eq!(overview.company_name, "Acme");
        assert!(
            (overview.data_quality_metrics.content_completeness - 0.9).abs() < f64::EPSILON
        );
    }

    #[tokio::test]
    async fn company_overview_without_url_is_insufficient() {
        let service = service_with(vec![], Some("content"));
        let err = service
            .generate_company_overview(&AnalysisRequest::default())
            .await
            .unwrap_err();
        match err {
            PipelineError::InsufficientContext { artifact, source_tag } => {
                assert_eq!(artifact, "company_overview");
                assert!(source_tag.is_none());
            }
            other => panic!("expected InsufficientContext, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn company_overview_unreachable_site_is_insufficient() {
        let service = service_with(vec![], None);
        let request = AnalysisRequest {
            website_url: Some("acme.example".to_string()),
            ..AnalysisRequest::default()
        };

        let err = service.generate_company_overview(&request).await.unwrap_err();
        match err {
            PipelineError::InsufficientContext { artifact, source_tag } => {
                assert_eq!(artifact, "company_overview");
                assert_eq!(source_tag.as_deref(), Some("website"));
            }
            other => panic!("expected InsufficientContext, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn target_account_from_sufficient_company_context() {
        let service = service_with(vec![account_json()], None);
        let request = AnalysisRequest {
            company_context: Some(json!({
                "company_name": "Acme",
                "company_overview": "Makes anvils",
                "capabilities": ["forging"]
            })),
            profile_name: Some("Mid-market manufacturers".to_string()),
            ..AnalysisRequest::default()
        };

        let profile = service.generate_target_account(&request).await.unwrap();
        assert_eq!(profile.target_account_name, "Mid-market manufacturers");
        assert_eq!(profile.firmographics.industry, vec!["Manufacturing"]);
    }

    #[tokio::test]
    async fn target_account_with_nothing_is_insufficient() {
        let service = service_with(vec![], None);
        let err = service
            .generate_target_account(&AnalysisRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientContext { ref artifact, .. } if artifact == "target_account"
        ));
    }

    #[tokio::test]
    async fn fenced_model_output_still_parses() {
        let fenced = format!("```json\n{}\n```", account_json());
        let service = service_with(vec![fenced], None);
        let request = AnalysisRequest {
            company_context: Some(json!({
                "company_name": "Acme",
                "company_overview": "Makes anvils",
                "capabilities": ["forging"]
            })),
            ..AnalysisRequest::default()
        };

        let profile = service.generate_target_account(&request).await.unwrap();
        assert_eq!(profile.target_account_name, "Mid-market manufacturers");
    }

    // ready_context is synchronous, so the not-ready rejection can be tested
    // without wiring a full resolver round-trip.
    #[tokio::test]
    async fn not_ready_envelope_carries_last_source() {
        let service = service_with(vec![], None);
        let envelope = ContextEnvelope {
            source: None,
            context: Value::Null,
            is_ready: false,
            html: None,
            from_cache: None,
        };
        let err = service.ready_context("target_persona", envelope).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientContext { ref artifact, .. } if artifact == "target_persona"
        ));
    }
}
