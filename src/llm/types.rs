//! Chat request types shared by every provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Token ceiling for a generated query. Few-shot answers stay well below it.
pub const GENERATION_MAX_TOKENS: u32 = 1024;

/// Token ceiling for an answer explanation.
pub const EXPLANATION_MAX_TOKENS: u32 = 512;

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message. Serializes to the `{role, content}` shape both
/// supported providers accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Why the pipeline is calling the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Turning a question into SPARQL.
    QueryGeneration,
    /// Describing a retrieved answer in prose.
    Explanation,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueryGeneration => "query generation",
            Self::Explanation => "explanation",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider-neutral chat completion request.
///
/// Both purposes run at temperature 0 so the same question yields the same
/// query across runs as far as the model allows.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub purpose: Purpose,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// A query generation request.
    pub fn generation(messages: Vec<Message>) -> Self {
        Self {
            purpose: Purpose::QueryGeneration,
            messages,
            temperature: 0.0,
            max_tokens: GENERATION_MAX_TOKENS,
        }
    }

    /// An answer explanation request.
    pub fn explanation(messages: Vec<Message>) -> Self {
        Self {
            purpose: Purpose::Explanation,
            messages,
            temperature: 0.0,
            max_tokens: EXPLANATION_MAX_TOKENS,
        }
    }

    /// Content of the system message, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Content of the last user message, or an empty string.
    pub fn user_input(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map_or("", |m| m.content.as_str())
    }
}
