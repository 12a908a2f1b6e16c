//! HTTP client for SPARQL endpoints.
//!
//! Speaks either the SPARQL 1.1 protocol directly or the JSON relay protocol,
//! depending on the configured [`StoreProtocol`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{SparqlExecutor, StoreProtocol};
use crate::config::StoreConfig;
use crate::error::{GlanceError, Result};

/// Media type requested from SPARQL protocol endpoints.
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Longest slice of an error body echoed back to the user.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// SPARQL endpoint client.
#[derive(Debug, Clone)]
pub struct HttpSparqlClient {
    endpoint: String,
    protocol: StoreProtocol,
    client: Client,
}

impl HttpSparqlClient {
    /// Creates a client for the configured endpoint.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GlanceError::store(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            protocol: config.protocol(),
            client,
        })
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the wire protocol in use.
    pub fn protocol(&self) -> StoreProtocol {
        self.protocol
    }

    /// Maps a non-success HTTP status to an error.
    ///
    /// Client errors mean the store rejected the query itself; anything else is
    /// a transport or server problem.
    fn status_error(status: StatusCode, body: &str) -> GlanceError {
        let body = truncate(body.trim(), MAX_ERROR_BODY_CHARS);

        if status.is_client_error() {
            GlanceError::query(format!("Endpoint rejected the query ({}): {}", status, body))
        } else {
            GlanceError::store(format!("Endpoint error ({}): {}", status, body))
        }
    }

    fn request_error(&self, e: reqwest::Error) -> GlanceError {
        if e.is_timeout() {
            GlanceError::store("Request to the SPARQL endpoint timed out")
        } else if e.is_connect() {
            GlanceError::store(format!(
                "Failed to connect to SPARQL endpoint {}",
                self.endpoint
            ))
        } else {
            GlanceError::store(format!("Request failed: {}", e))
        }
    }
}

#[async_trait]
impl SparqlExecutor for HttpSparqlClient {
    async fn execute(&self, query: &str) -> Result<Value> {
        let start = Instant::now();

        let request = match self.protocol {
            StoreProtocol::Sparql => self
                .client
                .post(&self.endpoint)
                .header(ACCEPT, SPARQL_RESULTS_JSON)
                .form(&[("query", query)]),
            StoreProtocol::Relay => self
                .client
                .post(&self.endpoint)
                .json(&RelayRequest { query }),
        };

        let response = request.send().await.map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GlanceError::store(format!("Failed to read response: {}", e)))?;

        debug!(
            protocol = %self.protocol,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis(),
            body_len = body.len(),
            "SPARQL endpoint responded"
        );

        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| GlanceError::store(format!("Failed to parse endpoint response: {}", e)))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    query: &'a str,
}
