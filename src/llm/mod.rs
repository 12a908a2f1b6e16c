//! Chat model access for the pipeline.
//!
//! [`LlmService`] is the pipeline's query generator and answer explainer. It
//! drives any [`LlmClient`]: OpenAI, a local Ollama server, or the mock used
//! in tests.

pub mod factory;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod service;
pub mod transport;
pub mod types;

pub use factory::create_client;
pub use mock::MockLlmClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use parser::{parse_llm_response, ParsedResponse};
pub use prompt::{build_explanation_messages, build_generation_messages};
pub use service::LlmService;
pub use types::{ChatRequest, Message, Purpose, Role};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Result;

/// A chat model that answers one request with one reply.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// Which backend answers chat requests. Spelled in lowercase in config files
/// and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Hosted chat completions; needs `OPENAI_API_KEY`.
    #[default]
    OpenAi,
    Ollama,
    /// Canned queries, no network.
    Mock,
}

impl LlmProvider {
    /// Config and command line spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Ollama => "Ollama",
            Self::Mock => "Mock model",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(format!(
                "Unknown LLM provider: {s}. Expected: openai, ollama or mock"
            )),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
