//! Generator factory.
//!
//! Centralizes provider-specific logic for creating generators.

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{GatewayError, Result};
use crate::llm::{Generator, LlmProvider, MockGenerator, OllamaConfig, OllamaGenerator};

/// Creates a generator from the LLM section of the configuration.
///
/// Model and endpoint come from the config, with `OLLAMA_MODEL` and
/// `OLLAMA_URL` filling whatever the config leaves unset.
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    let provider: LlmProvider = config.provider.parse().map_err(GatewayError::config)?;

    match provider {
        LlmProvider::Ollama => {
            let mut config = config.clone();
            config.apply_env_defaults();
            let generator = OllamaGenerator::new(OllamaConfig::from(&config))?;
            Ok(Arc::new(generator))
        }
        LlmProvider::Mock => Ok(Arc::new(MockGenerator::new())),
    }
}
