//! Local Ollama client (`/api/chat`, non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GlanceError, Result};
use crate::llm::transport::{ChatTransport, RetryPolicy};
use crate::llm::types::{ChatRequest, Message};
use crate::llm::{LlmClient, LlmProvider};

/// Where `ollama serve` listens by default. `OLLAMA_URL` overrides it.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone)]
pub struct OllamaClient {
    transport: ChatTransport,
    model: String,
}

impl OllamaClient {
    /// Creates a client for the server at `base_url`, or the default when `None`.
    pub fn new(model: impl Into<String>, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let base = base_url.unwrap_or(DEFAULT_OLLAMA_URL).trim_end_matches('/');
        let transport = ChatTransport::new(
            LlmProvider::Ollama,
            format!("{base}/api/chat"),
            None,
            timeout,
            RetryPolicy::LOCAL,
        )?;

        Ok(Self {
            transport,
            model: model.into(),
        })
    }

    fn body<'a>(&'a self, request: &'a ChatRequest) -> ChatBody<'a> {
        ChatBody {
            model: &self.model,
            messages: &request.messages,
            stream: false,
            options: Options {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let text = self.transport.post(request.purpose, &self.body(request)).await?;

        let reply: ChatReply = serde_json::from_str(&text).map_err(|e| {
            GlanceError::llm(format!("Unreadable Ollama {} reply: {e}", request.purpose))
        })?;

        Ok(reply.message.content)
    }
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}
