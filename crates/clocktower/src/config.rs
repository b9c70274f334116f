//! Application configuration loaded from TOML.

use crate::llm_client::{LlmConfig, LlmProvider};
use clocktower_rules::{ConfigError, RulesConfig};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Who decides for the automated seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OracleProvider {
    /// OpenAI-compatible chat completions.
    OpenAI,
    /// Anthropic messages API.
    Anthropic,
    /// Local rules of thumb, no network.
    Heuristic,
}

impl OracleProvider {
    /// The wire protocol, or `None` for the local heuristic.
    pub fn llm_provider(self) -> Option<LlmProvider> {
        match self {
            OracleProvider::OpenAI => Some(LlmProvider::OpenAI),
            OracleProvider::Anthropic => Some(LlmProvider::Anthropic),
            OracleProvider::Heuristic => None,
        }
    }

    /// Environment variable read for the key when none is configured.
    pub fn default_key_env(self) -> &'static str {
        match self {
            OracleProvider::OpenAI => "OPENAI_API_KEY",
            OracleProvider::Anthropic => "ANTHROPIC_API_KEY",
            OracleProvider::Heuristic => "",
        }
    }
}

/// Settings for the automated seats' oracle.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Provider (openai, anthropic or heuristic).
    #[serde(default = "default_provider")]
    provider: OracleProvider,

    /// Model name.
    #[serde(default = "default_model")]
    model: String,

    /// Base URL for OpenAI-compatible endpoints.
    #[serde(default)]
    api_base: Option<String>,

    /// Name of the environment variable holding the API key.
    #[serde(default)]
    api_key_env: Option<String>,

    /// Maximum tokens per reply.
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,

    /// Seconds to wait for one decision.
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

#[instrument]
fn default_provider() -> OracleProvider {
    OracleProvider::OpenAI
}

#[instrument]
fn default_model() -> String {
    "qwen-plus".to_string()
}

fn default_max_tokens() -> u32 {
    800
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_base: None,
            api_key_env: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OracleConfig {
    /// A configuration that never leaves the machine.
    pub fn heuristic() -> Self {
        Self {
            provider: OracleProvider::Heuristic,
            ..Self::default()
        }
    }

    /// Time allowed for one decision.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Environment variable the key is read from.
    pub fn key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or(self.provider.default_key_env())
    }

    /// Builds the client configuration, reading the key from the environment.
    ///
    /// # Errors
    ///
    /// Fails for the heuristic provider or when the key variable is unset.
    #[instrument(skip(self), fields(provider = %self.provider, model = %self.model))]
    pub fn create_llm_config(&self) -> Result<LlmConfig, ConfigError> {
        let provider = self
            .provider
            .llm_provider()
            .ok_or_else(|| ConfigError::new("The heuristic oracle has no LLM configuration"))?;

        let key_env = self.key_env();
        let api_key = std::env::var(key_env).map_err(|_| {
            ConfigError::new(format!("{key_env} environment variable not set"))
        })?;
        debug!(key_env, "API key found");

        let config = LlmConfig::new(provider, api_key, self.model.clone(), self.max_tokens);
        Ok(match &self.api_base {
            Some(base) => config.with_api_base(base.clone()),
            None => config,
        })
    }
}

/// Everything read from `clocktower.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// Table rules.
    #[serde(default)]
    rules: RulesConfig,

    /// Oracle for the automated seats.
    #[serde(default)]
    oracle: OracleConfig,

    /// Fixed seed for a reproducible game.
    #[serde(default)]
    seed: Option<u64>,
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {e}")))?;

        info!(provider = %config.oracle.provider, seed = ?config.seed, "Config loaded");
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Replaces the seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if seed.is_some() {
            self.seed = seed;
        }
        self
    }

    /// Switches the automated seats to the local heuristic.
    pub fn with_heuristic(mut self) -> Self {
        self.oracle = OracleConfig {
            provider: OracleProvider::Heuristic,
            ..self.oracle
        };
        self
    }
}
