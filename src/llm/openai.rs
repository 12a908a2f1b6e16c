//! OpenAI chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{GlanceError, Result};
use crate::llm::transport::{ChatTransport, RetryPolicy};
use crate::llm::types::{ChatRequest, Message};
use crate::llm::{LlmClient, LlmProvider};

/// Chat completions endpoint. `OPENAI_API_URL` overrides it for compatible gateways.
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    transport: ChatTransport,
    model: String,
}

impl OpenAiClient {
    /// Creates a client posting to `api_url`, or the public API when `None`.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let transport = ChatTransport::new(
            LlmProvider::OpenAi,
            api_url.unwrap_or_else(|| OPENAI_API_URL.to_string()),
            Some(api_key.into()),
            timeout,
            RetryPolicy::HOSTED,
        )?;

        Ok(Self {
            transport,
            model: model.into(),
        })
    }

    fn body<'a>(&'a self, request: &'a ChatRequest) -> CompletionBody<'a> {
        CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let text = self.transport.post(request.purpose, &self.body(request)).await?;
        read_completion(&text, request)
    }
}

/// Extracts the first choice's content from a completions reply.
fn read_completion(text: &str, request: &ChatRequest) -> Result<String> {
    let reply: CompletionReply = serde_json::from_str(text).map_err(|e| {
        GlanceError::llm(format!("Unreadable OpenAI {} reply: {e}", request.purpose))
    })?;

    reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            GlanceError::llm(format!("OpenAI returned no text for the {} request", request.purpose))
        })
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
