//! gtmforge - Marketing-intelligence artifact generation with LLM failover
//!
//! This crate generates structured go-to-market artifacts (company overviews,
//! target-account profiles, buyer personas) by resolving the best available
//! context for each artifact and feeding it through a prioritized chain of
//! LLM providers with per-provider circuit breaking.
//!
//! The workspace is split into focused member crates, re-exported here:
//!
//! - [`llm`] — provider adapters, the failover client, circuit breakers, and
//!   structured-output validation.
//! - [`context`] — sufficiency predicates and context resolution.
//! - [`scrape`] — website content extraction with an in-process cache.
//! - [`prompt`] — embedded prompt templates and rendering.
//! - [`pipeline`] — artifact schemas, preprocessing, and the analysis
//!   service.
//! - [`config`] — TOML configuration with environment overrides.
//! - [`error`] — the shared error taxonomy.
//!
//! # Quick Start
//!
//! ```no_run
//! use gtmforge::config::GtmConfig;
//! use gtmforge::llm::{GenerationRequest, client_from_config};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GtmConfig::load(std::path::Path::new("gtmforge.toml"))?;
//! let client = client_from_config(&config)?;
//!
//! let request = GenerationRequest::new("Summarize this company in one line.");
//! let response = client.generate(&request).await?;
//! println!("{} (via {})", response.text, response.provider);
//! # Ok(())
//! # }
//! ```
//!
//! Providers are tried in priority order; a provider whose circuit breaker is
//! open is skipped without a call, and a request only fails once every
//! registered provider has been exhausted.

pub use gtmforge_config as config;
pub use gtmforge_context as context;
pub use gtmforge_llm as llm;
pub use gtmforge_pipeline as pipeline;
pub use gtmforge_prompt as prompt;
pub use gtmforge_scrape as scrape;
pub use gtmforge_utils::error;

pub use gtmforge_config::GtmConfig;
pub use gtmforge_llm::{GenerationRequest, GenerationResponse, LlmClient, client_from_config};
pub use gtmforge_pipeline::{AnalysisRequest, AnalysisService};
pub use gtmforge_utils::error::GtmForgeError;
