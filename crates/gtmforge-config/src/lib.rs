//! Configuration model for gtmforge.
//!
//! All environment parsing happens here, once, at load time. The rest of the
//! workspace receives plain structs — the circuit breaker, the orchestrating
//! client, and the backends never read the environment themselves (backends
//! resolve their API keys through the `api_key_env` indirection recorded in
//! these structs, at construction time).

mod config;

pub use config::{
    AnthropicConfig, BreakerSettings, GeminiConfig, GtmConfig, LlmConfig, OpenAiConfig,
    ScrapeConfig,
};
