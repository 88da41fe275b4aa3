use gtmforge_utils::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for the gtmforge core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GtmConfig {
    /// LLM provider and breaker settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Website extractor settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

/// LLM section: one optional block per provider, plus breaker settings.
///
/// A provider with no block is simply not registered. A provider block with
/// missing credentials fails at backend construction, not at call time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub openai: Option<OpenAiConfig>,
    pub anthropic: Option<AnthropicConfig>,
    pub gemini: Option<GeminiConfig>,
    #[serde(default)]
    pub breaker: BreakerSettings,
}

/// OpenAI chat-completions backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Environment variable holding the API key. Defaults to `OPENAI_API_KEY`.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Anthropic messages-API backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Environment variable holding the API key. Defaults to `ANTHROPIC_API_KEY`.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Gemini backend settings.
///
/// Unlike the other providers, a Gemini block with an unset key env var does
/// not fail construction — the backend registers itself permanently disabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Environment variable holding the API key. Defaults to `GEMINI_API_KEY`.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// Circuit breaker settings, injected into every per-provider breaker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BreakerSettings {
    /// Consecutive failures before the breaker opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds the breaker stays open before admitting a trial call.
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,
    /// When true, breakers always admit calls and never change state.
    #[serde(default)]
    pub disable: bool,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout_secs() -> u64 {
    300
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
            disable: false,
        }
    }
}

/// Website extractor settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Environment variable holding the extractor API key. Defaults to
    /// `FIRECRAWL_API_KEY`.
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    /// Max pages per crawl. Defaults to 5.
    pub crawl_limit: Option<u32>,
}

impl GtmConfig {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFile` on TOML syntax or shape errors.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut config: GtmConfig =
            toml::from_str(s).map_err(|e| ConfigError::InvalidFile(e.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFile` if the file cannot be read or
    /// parsed, or `ConfigError::InvalidValue` on semantic problems.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Breaker overrides from the environment, applied once at load time.
    ///
    /// `GTMFORGE_BREAKER_FAILURE_THRESHOLD`, `GTMFORGE_BREAKER_RECOVERY_TIMEOUT`
    /// and `GTMFORGE_BREAKER_DISABLE` take precedence over the file values.
    /// Unparsable values are ignored rather than fatal.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("GTMFORGE_BREAKER_FAILURE_THRESHOLD")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.breaker.failure_threshold = n;
        }
        if let Ok(v) = std::env::var("GTMFORGE_BREAKER_RECOVERY_TIMEOUT")
            && let Ok(n) = v.parse::<u64>()
        {
            self.llm.breaker.recovery_timeout_secs = n;
        }
        if let Ok(v) = std::env::var("GTMFORGE_BREAKER_DISABLE") {
            self.llm.breaker.disable = v.eq_ignore_ascii_case("true") || v == "1";
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.breaker.failure_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "llm.breaker.failure_threshold".to_string(),
                value: "0".to_string(),
            });
        }
        if let Some(limit) = self.scrape.crawl_limit
            && limit == 0
        {
            return Err(ConfigError::InvalidValue {
                key: "scrape.crawl_limit".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Minimal configuration for tests: no providers, a low failure threshold
    /// and a short recovery timeout.
    #[must_use]
    pub fn minimal_for_testing() -> Self {
        Self {
            llm: LlmConfig {
                openai: None,
                anthropic: None,
                gemini: None,
                breaker: BreakerSettings {
                    failure_threshold: 3,
                    recovery_timeout_secs: 1,
                    disable: false,
                },
            },
            scrape: ScrapeConfig::default(),
        }
    }
}
