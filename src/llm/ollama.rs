//! Ollama generator implementation.
//!
//! Sends the prompt verbatim (`raw: true`) to `/api/generate`, so the chat
//! template built by [`crate::llm::prompt`] reaches the model untouched.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::{LlmConfig, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use crate::error::{GatewayError, Result};
use crate::llm::Generator;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default generation limit.
const DEFAULT_MAX_TOKENS: u32 = 512;

/// Ollama generator configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model to use (e.g., "phi3:mini").
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Stop sequences.
    pub stop: Vec<String>,
}

impl OllamaConfig {
    /// Creates a new config with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: model.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            stop: vec!["<|end|>".to_string()],
        }
    }

    /// Sets the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl From<&LlmConfig> for OllamaConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            model: config.model().to_string(),
            timeout_secs: config.timeout_secs,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stop: config.stop.clone(),
        }
    }
}

/// Ollama text generator.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    config: OllamaConfig,
    client: Client,
}

impl OllamaGenerator {
    /// Creates a new Ollama generator with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::generation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the generate API endpoint URL.
    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url)
    }

    fn request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.config.model,
            prompt,
            raw: true,
            stream: false,
            options: GenerateOptions {
                num_predict: self.config.max_tokens,
                stop: &self.config.stop,
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.config.model, "Sending prompt to Ollama");

        let response = self
            .client
            .post(self.generate_url())
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::generation("Request timed out. Try again.")
                } else if e.is_connect() {
                    GatewayError::generation(
                        "Failed to connect to Ollama. Is it running? Try: ollama serve",
                    )
                } else {
                    GatewayError::generation(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::generation(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(GatewayError::generation(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let response: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::generation(format!("Failed to parse response: {}", e)))?;

        Ok(response.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    options: GenerateOptions<'a>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    num_predict: u32,
    stop: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
