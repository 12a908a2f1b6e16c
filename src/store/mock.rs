//! Mock SPARQL executors for testing.
//!
//! Provides in-memory executors with scripted responses.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::SparqlExecutor;
use crate::error::{GlanceError, Result};

/// A scripted response: an envelope or an error message.
type Scripted = std::result::Result<Value, String>;

/// A mock executor that returns predefined envelopes.
///
/// Scripted responses are consumed in order; once they run out every call gets
/// the default envelope. All received queries are recorded.
pub struct MockSparqlExecutor {
    default_envelope: Value,
    scripted: Mutex<VecDeque<Scripted>>,
    received: Mutex<Vec<String>>,
}

impl MockSparqlExecutor {
    /// Creates a mock that answers every query with a single binding row.
    pub fn new() -> Self {
        Self {
            default_envelope: json!({
                "head": {"vars": ["result"]},
                "results": {"bindings": [
                    {"result": {"type": "literal", "value": "mock result"}}
                ]}
            }),
            scripted: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the default envelope.
    pub fn with_envelope(mut self, envelope: Value) -> Self {
        self.default_envelope = envelope;
        self
    }

    /// Answers every query with an empty binding set.
    pub fn empty() -> Self {
        Self::new().with_envelope(json!({"head": {"vars": []}, "results": {"bindings": []}}))
    }

    /// Queues an envelope for the next unscripted call.
    pub fn then_respond(self, envelope: Value) -> Self {
        self.push(Ok(envelope));
        self
    }

    /// Queues a failure for the next unscripted call.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    /// Returns every query received so far, oldest first.
    pub fn received_queries(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    fn push(&self, response: Scripted) {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.push_back(response);
        }
    }
}

impl Default for MockSparqlExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SparqlExecutor for MockSparqlExecutor {
    async fn execute(&self, query: &str) -> Result<Value> {
        if let Ok(mut received) = self.received.lock() {
            received.push(query.to_string());
        }

        let next = self
            .scripted
            .lock()
            .map_err(|_| GlanceError::internal("mock executor lock poisoned"))?
            .pop_front();

        match next {
            Some(Ok(envelope)) => Ok(envelope),
            Some(Err(message)) => Err(GlanceError::query(message)),
            None => Ok(self.default_envelope.clone()),
        }
    }
}

/// An executor that rejects every query.
pub struct FailingSparqlExecutor {
    message: String,
}

impl FailingSparqlExecutor {
    /// Creates an executor failing with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl SparqlExecutor for FailingSparqlExecutor {
    async fn execute(&self, _query: &str) -> Result<Value> {
        Err(GlanceError::store(self.message.clone()))
    }
}
