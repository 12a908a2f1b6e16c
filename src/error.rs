//! Error types for rdf-glance.
//!
//! The store, LLM and configuration layers return [`GlanceError`]. The
//! pipeline never propagates it: each fault is folded into an
//! [`Answer`](crate::pipeline::Answer) at the stage where it happened.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlanceError {
    /// The SPARQL endpoint could not be reached or answered with a server fault.
    #[error("Store error: {0}")]
    Store(String),

    /// The store refused a query, or answered with an envelope that is not a result.
    #[error("Query error: {0}")]
    Query(String),

    /// A chat model request failed. `transient` faults may succeed on retry.
    #[error("LLM error: {message}")]
    Llm { message: String, transient: bool },

    /// Bad config file, endpoint URL, graph IRI or command line.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GlanceError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// An LLM fault that retrying will not fix (bad key, malformed reply).
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm {
            message: msg.into(),
            transient: false,
        }
    }

    /// An LLM fault worth retrying (rate limit, timeout, provider outage).
    pub fn llm_transient(msg: impl Into<String>) -> Self {
        Self::Llm {
            message: msg.into(),
            transient: true,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True if the same request may succeed when sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Llm { transient: true, .. })
    }

    /// Category label used when logging a fatal error.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Store(_) => "Store Error",
            Self::Query(_) => "Query Error",
            Self::Llm { .. } => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// The message without its category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Llm { message, .. } => message,
            Self::Store(m) | Self::Query(m) | Self::Config(m) | Self::Internal(m) => m,
        }
    }
}

pub type Result<T> = std::result::Result<T, GlanceError>;
