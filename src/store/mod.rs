//! Triple store access for rdf-glance.
//!
//! Provides a trait-based interface for running SPARQL queries, allowing the
//! HTTP client to be swapped for deterministic fakes in tests.

mod graph;
mod http;
mod mock;
mod types;

pub use graph::NamedGraphRef;
pub use http::HttpSparqlClient;
pub use mock::{FailingSparqlExecutor, MockSparqlExecutor};
pub use types::{Bindings, ResultSet, Row, Term, TermKind};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::Result;

/// Wire protocol used to reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProtocol {
    /// SPARQL 1.1 protocol: form-encoded `query` POSTed to the endpoint.
    #[default]
    Sparql,
    /// JSON relay: `{"query": "..."}` POSTed to a forwarding service that answers
    /// with the result envelope or `{"error": "..."}`.
    Relay,
}

impl StoreProtocol {
    /// Returns the protocol as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sparql => "sparql",
            Self::Relay => "relay",
        }
    }
}

impl FromStr for StoreProtocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sparql" => Ok(Self::Sparql),
            "relay" => Ok(Self::Relay),
            _ => Err(format!(
                "Unknown store protocol: {s}. Expected: sparql or relay"
            )),
        }
    }
}

impl fmt::Display for StoreProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates an executor for the given store configuration.
pub fn connect(config: &StoreConfig) -> Result<Box<dyn SparqlExecutor>> {
    Ok(Box::new(HttpSparqlClient::new(config)?))
}

/// Trait for anything that can run a SPARQL query.
///
/// Implementations return the raw result envelope; callers decide whether its
/// shape is acceptable (see [`ResultSet::from_envelope`]).
#[async_trait]
pub trait SparqlExecutor: Send + Sync {
    /// Runs the query and returns the decoded JSON response body.
    async fn execute(&self, query: &str) -> Result<Value>;

    /// Runs the query and parses the response into a [`ResultSet`].
    async fn select(&self, query: &str) -> Result<ResultSet> {
        let envelope = self.execute(query).await?;
        ResultSet::from_envelope(&envelope)
    }
}
