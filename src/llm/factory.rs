//! Builds the configured [`LlmClient`].

use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{GlanceError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OllamaClient, OpenAiClient};

/// Creates a client for the provider named in `config`.
///
/// OpenAI takes `api_key`, falling back to `OPENAI_API_KEY`, and honours
/// `OPENAI_API_URL`. Ollama honours `OLLAMA_URL`.
pub fn create_client(config: &LlmConfig, api_key: Option<String>) -> Result<Box<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.provider {
        LlmProvider::OpenAi => {
            let key = api_key
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| GlanceError::config("No API key configured. Set OPENAI_API_KEY."))?;
            let url = std::env::var("OPENAI_API_URL").ok();
            Ok(Box::new(OpenAiClient::new(key, config.model.as_str(), url, timeout)?))
        }
        LlmProvider::Ollama => {
            let url = std::env::var("OLLAMA_URL").ok();
            Ok(Box::new(OllamaClient::new(
                config.model.as_str(),
                url.as_deref(),
                timeout,
            )?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}
