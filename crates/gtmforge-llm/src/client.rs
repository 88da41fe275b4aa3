//! Orchestrating LLM client: priority-ordered failover across registered
//! providers with per-provider circuit breaking.

use crate::breaker::{BreakerStatus, CircuitBreaker};
use crate::structured;
use crate::types::{GenerationRequest, GenerationResponse, ProviderAdapter};
use gtmforge_config::BreakerSettings;
use gtmforge_utils::error::{LlmClientError, ProviderError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

#[derive(Clone)]
struct RegisteredProvider {
    adapter: Arc<dyn ProviderAdapter>,
    breaker: Arc<CircuitBreaker>,
}

/// Failover client over a set of provider adapters.
///
/// Providers are tried in ascending priority order, ties keeping registration
/// order. Each provider has exactly one circuit breaker, keyed by its stable
/// name. The provider table is read-mostly: `register_provider` is the only
/// mutator, and generation snapshots the table so the table lock is never
/// held across a backend call.
pub struct LlmClient {
    providers: RwLock<Vec<RegisteredProvider>>,
    breaker_settings: BreakerSettings,
}

impl LlmClient {
    #[must_use]
    pub fn new(breaker_settings: BreakerSettings) -> Self {
        Self {
            providers: RwLock::new(Vec::new()),
            breaker_settings,
        }
    }

    /// Register a provider, creating its circuit breaker.
    ///
    /// The table is re-sorted by priority; the sort is stable so providers
    /// sharing a priority keep their registration order.
    pub fn register_provider(&self, adapter: Arc<dyn ProviderAdapter>) {
        let breaker = Arc::new(CircuitBreaker::new(adapter.name(), self.breaker_settings));
        let mut providers = self.providers.write().expect("provider table poisoned");
        providers.push(RegisteredProvider { adapter, breaker });
        providers.sort_by_key(|p| p.adapter.priority());
    }

    /// Registered provider names in failover order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .read()
            .expect("provider table poisoned")
            .iter()
            .map(|p| p.adapter.name().to_string())
            .collect()
    }

    /// Breaker status per provider, in failover order.
    pub async fn provider_status(&self) -> Vec<(String, BreakerStatus)> {
        let snapshot = self.snapshot();
        let mut out = Vec::with_capacity(snapshot.len());
        for provider in snapshot {
            out.push((
                provider.adapter.name().to_string(),
                provider.breaker.status().await,
            ));
        }
        out
    }

    fn snapshot(&self) -> Vec<RegisteredProvider> {
        self.providers
            .read()
            .expect("provider table poisoned")
            .clone()
    }

    /// Run one generation request through the failover loop.
    ///
    /// Each provider's outcome is inspected explicitly: a success records
    /// against the breaker and returns immediately; a failure records, is
    /// remembered as a cause, and the loop moves on. Providers whose breaker
    /// rejects the call are skipped with a `CircuitOpen` cause.
    ///
    /// # Errors
    ///
    /// Returns `LlmClientError::AllProvidersFailed` with the per-provider
    /// causes in attempt order when no provider produced a response.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, LlmClientError> {
        let snapshot = self.snapshot();
        let mut causes: Vec<(String, ProviderError)> = Vec::new();

        for provider in snapshot {
            let name = provider.adapter.name().to_string();

            if !provider.breaker.can_execute().await {
                debug!(provider = %name, "Skipping provider, circuit breaker open");
                causes.push((name.clone(), ProviderError::CircuitOpen(name)));
                continue;
            }

            debug!(provider = %name, "Attempting provider");
            match provider.adapter.generate(request).await {
                Ok(response) => {
                    provider.breaker.record_success().await;
                    debug!(provider = %name, model = %response.model, "Provider succeeded");
                    return Ok(response);
                }
                Err(e) => {
                    provider.breaker.record_failure().await;
                    warn!(provider = %name, error = %e, "Provider failed, trying next");
                    causes.push((name, e));
                }
            }
        }

        Err(LlmClientError::AllProvidersFailed { causes })
    }

    /// Generate and return schema-validated JSON.
    ///
    /// The request's `response_schema` drives both the backend JSON hint and
    /// the post-hoc validation; a request without one is validated against
    /// the permissive boolean schema. Fenced ```json blocks are unwrapped and
    /// the quality metrics normalized before validation. Malformed output is
    /// not retried here.
    ///
    /// # Errors
    ///
    /// `AllProvidersFailed` when no provider answered, `MalformedOutput` when
    /// the answer failed parsing or validation.
    pub async fn generate_structured(
        &self,
        request: GenerationRequest,
    ) -> Result<Value, LlmClientError> {
        let schema = request
            .response_schema
            .clone()
            .unwrap_or(Value::Bool(true));
        let response = self.generate(&request).await?;
        structured::parse_and_validate(&response.text, &schema)
    }

    /// Typed variant of [`generate_structured`](Self::generate_structured):
    /// deserializes the validated JSON into `T`.
    ///
    /// # Errors
    ///
    /// As `generate_structured`, plus `MalformedOutput` when the validated
    /// JSON does not deserialize into `T`.
    pub async fn generate_structured_as<T: DeserializeOwned>(
        &self,
        request: GenerationRequest,
    ) -> Result<T, LlmClientError> {
        let value = self.generate_structured(request).await?;
        let raw = value.to_string();
        serde_json::from_value(value).map_err(|e| LlmClientError::MalformedOutput {
            reason: format!("validated JSON does not match expected shape: {e}"),
            raw,
            fields: Vec::new(),
        })
    }
}
