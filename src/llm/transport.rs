//! HTTP plumbing shared by the chat providers.
//!
//! Providers only build their request body and read their reply shape.
//! Posting, status mapping and retrying transient faults live here.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{GlanceError, Result};
use crate::llm::types::Purpose;
use crate::llm::LlmProvider;

/// Longest slice of a provider error body kept in an error message.
const MAX_ERROR_DETAIL_CHARS: usize = 300;

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Three attempts with 1s, then 2s backoff. Suits hosted APIs.
    pub const HOSTED: Self = Self {
        attempts: 3,
        base_delay: Duration::from_millis(1000),
    };

    /// A single attempt. A local server that is down stays down.
    pub const LOCAL: Self = Self {
        attempts: 1,
        base_delay: Duration::ZERO,
    };
}

/// A chat endpoint: where to post, how to authenticate, how to retry.
#[derive(Debug, Clone)]
pub struct ChatTransport {
    provider: LlmProvider,
    url: String,
    bearer: Option<String>,
    retry: RetryPolicy,
    client: Client,
}

impl ChatTransport {
    pub fn new(
        provider: LlmProvider,
        url: impl Into<String>,
        bearer: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GlanceError::llm(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            provider,
            url: url.into(),
            bearer,
            retry,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts `body` and returns the success body, retrying transient faults.
    pub async fn post<B: Serialize + Sync>(&self, purpose: Purpose, body: &B) -> Result<String> {
        let mut delay = self.retry.base_delay;
        let mut attempt = 1;

        loop {
            debug!(
                provider = %self.provider,
                %purpose,
                attempt,
                "Sending chat request"
            );

            let err = match self.post_once(purpose, body).await {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= self.retry.attempts {
                return Err(err);
            }

            warn!(
                provider = %self.provider,
                %purpose,
                attempt,
                "{}; retrying in {:?}",
                err.message(),
                delay
            );
            tokio::time::sleep(delay).await;
            delay *= 2;
            attempt += 1;
        }
    }

    async fn post_once<B: Serialize + Sync>(&self, purpose: Purpose, body: &B) -> Result<String> {
        let mut request = self.client.post(&self.url).json(body);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.send_error(purpose, &e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            GlanceError::llm_transient(format!(
                "Failed to read the {} {purpose} reply: {e}",
                self.provider.display_name()
            ))
        })?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(self.status_error(purpose, status, &text))
        }
    }

    fn send_error(&self, purpose: Purpose, e: &reqwest::Error) -> GlanceError {
        let name = self.provider.display_name();
        if e.is_timeout() {
            GlanceError::llm_transient(format!("{name} {purpose} request timed out"))
        } else if e.is_connect() {
            let hint = match self.provider {
                LlmProvider::Ollama => ". Is it running? Try: ollama serve",
                _ => "",
            };
            GlanceError::llm_transient(format!("Failed to connect to {name} at {}{hint}", self.url))
        } else {
            GlanceError::llm(format!("{name} {purpose} request failed: {e}"))
        }
    }

    fn status_error(&self, purpose: Purpose, status: StatusCode, body: &str) -> GlanceError {
        let name = self.provider.display_name();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GlanceError::llm(format!("{name} rejected the API key. Check OPENAI_API_KEY."))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                GlanceError::llm_transient(format!("{name} rate limited the {purpose} request"))
            }
            _ => {
                let msg = format!("{name} {purpose} request failed ({status}): {}", error_detail(body));
                if status.is_server_error() {
                    GlanceError::llm_transient(msg)
                } else {
                    GlanceError::llm(msg)
                }
            }
        }
    }
}

/// Pulls the provider's own message out of an error body.
///
/// Understands `{"error": {"message": ...}}` and `{"error": "..."}`; anything
/// else is echoed, truncated.
fn error_detail(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| match &v["error"] {
        Value::String(s) => Some(s.as_str()),
        Value::Object(o) => o.get("message").and_then(Value::as_str),
        _ => None,
    });

    let detail = message.unwrap_or(body).trim();
    match detail.char_indices().nth(MAX_ERROR_DETAIL_CHARS) {
        Some((idx, _)) => format!("{}…", &detail[..idx]),
        None => detail.to_string(),
    }
}
