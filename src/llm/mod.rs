//! Text generator integration for querygate.
//!
//! The generator is a black box: a prompt goes in, raw text comes out. Nothing
//! it returns is trusted; the gateway extracts and validates it.

pub mod factory;
pub mod mock;
pub mod ollama;
pub mod prompt;

pub use factory::create_generator;
pub use mock::MockGenerator;
pub use ollama::{OllamaConfig, OllamaGenerator};
pub use prompt::build_prompt;

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for text generators that turn a prompt into raw model output.
///
/// Implementations must be thread-safe (Send + Sync) so a single instance can
/// serve concurrent requests.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates raw text for the given prompt.
    ///
    /// Failures are reported as `GatewayError::Generation`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Returns a short name for logs.
    fn name(&self) -> &str;
}

/// Generator provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Local Ollama instance
    #[default]
    Ollama,
    /// Canned responses for testing
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
