//! Configuration management for querygate.
//!
//! Handles loading configuration from TOML files and environment variables.
//! Only the text generator is configurable; the data source is always given
//! per request.

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Ollama API URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default model name.
pub const DEFAULT_MODEL: &str = "phi3:mini";

/// Main configuration structure for querygate.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Text generator configuration.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Text generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Provider: "ollama" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name (e.g., "phi3:mini").
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL of the generator endpoint.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; the generator's default when unset.
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Stop sequences passed to the generator.
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_tokens() -> u32 {
    512
}

fn default_stop() -> Vec<String> {
    vec!["<|end|>".to_string()]
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: None,
            stop: default_stop(),
        }
    }
}

impl LlmConfig {
    /// Returns the configured model, or the default.
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Returns the configured base URL without a trailing slash, or the default.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(DEFAULT_OLLAMA_URL)
    }

    /// Applies environment variables (OLLAMA_URL, OLLAMA_MODEL) as defaults.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    fn apply_defaults_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.base_url.is_none() {
            self.base_url = lookup("OLLAMA_URL");
        }
        if self.model.is_none() {
            self.model = lookup("OLLAMA_MODEL");
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("querygate")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            GatewayError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
