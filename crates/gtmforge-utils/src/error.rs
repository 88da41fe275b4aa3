use thiserror::Error;

/// Library-level error type aggregating every failure the gtmforge core can
/// surface.
///
/// Callers of the analysis pipeline receive either a validated structured
/// artifact or exactly one of these typed conditions — never a
/// partially-populated result.
///
/// # Error categories
///
/// | Category | Description | Retry? |
/// |----------|-------------|--------|
/// | `Config` | Missing credentials or invalid setup, fatal at construction | no |
/// | `Llm` | All providers exhausted, or output failed parsing/validation | caller's call |
/// | `Scrape` | Website content could not be extracted | treated as insufficient input |
/// | `Prompt` | Unknown template or missing template variable | no |
/// | `Pipeline` | Insufficient context for the requested artifact | provide more input |
#[derive(Error, Debug)]
pub enum GtmForgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM client error: {0}")]
    Llm(#[from] LlmClientError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
///
/// These are fatal at construction time: an adapter that cannot load its
/// credentials fails here instead of failing lazily on the first call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Environment variable '{var}' is not set ({purpose})")]
    MissingEnv { var: String, purpose: String },
}

/// A single backend call failed.
///
/// Recorded against the provider's circuit breaker and triggers failover to
/// the next provider; never escapes the orchestrating client except inside
/// [`LlmClientError::AllProvidersFailed`].
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Authentication rejected by backend: {0}")]
    Auth(String),

    #[error("Backend returned HTTP {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Provider '{0}' is not configured and is permanently disabled")]
    NotConfigured(String),

    #[error("Circuit breaker open for provider '{0}'")]
    CircuitOpen(String),

    #[error("Backend returned an empty response")]
    EmptyResponse,
}

/// Errors surfaced by the orchestrating LLM client.
#[derive(Error, Debug)]
pub enum LlmClientError {
    /// Every registered adapter was tried (or skipped by its breaker) and
    /// none produced a response. Carries the per-provider causes in the
    /// order the providers were attempted.
    #[error("All LLM providers failed or are unavailable ({} cause(s))", causes.len())]
    AllProvidersFailed {
        causes: Vec<(String, ProviderError)>,
    },

    /// The backend answered, but the text was not valid JSON or failed
    /// schema validation. `fields` holds the offending instance paths for
    /// schema violations, empty for plain parse failures.
    #[error("LLM returned malformed structured output: {reason}")]
    MalformedOutput {
        reason: String,
        raw: String,
        fields: Vec<String>,
    },
}

impl LlmClientError {
    /// Whether the caller may reasonably retry the same request.
    ///
    /// Exhausted providers are a transient condition; malformed output will
    /// usually recur unless the prompt changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllProvidersFailed { .. })
    }
}

/// Website extraction errors.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request to extractor failed: {0}")]
    Http(String),

    /// No extractable content after both a direct fetch and a crawl
    /// fallback. Callers treat this as "insufficient input", not as a
    /// generation failure.
    #[error("No extractable content available for {url}")]
    ContentUnavailable { url: String },
}

/// Prompt rendering errors.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Unknown prompt template '{0}'")]
    UnknownTemplate(String),

    #[error("Template '{template}' is missing required variable '{variable}'")]
    MissingVariable { template: String, variable: String },
}

/// Analysis pipeline errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The resolver could not find a sufficient context source. Carries the
    /// source tag that was last considered (if any) so the caller can build
    /// a structured "need more input" response.
    #[error("Insufficient context to generate '{artifact}'")]
    InsufficientContext {
        artifact: String,
        source_tag: Option<String>,
    },

    #[error(transparent)]
    Llm(#[from] LlmClientError),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}
