//! Foundation utilities shared across the gtmforge workspace.
//!
//! This crate owns the error taxonomy and the tracing setup. Everything else
//! lives in the domain crates.

pub mod error;
pub mod logging;

pub use error::{
    ConfigError, GtmForgeError, LlmClientError, PipelineError, PromptError, ProviderError,
    ScrapeError,
};
