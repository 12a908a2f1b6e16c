//! Configuration management for rdf-glance.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for named stores, LLM provider settings and extra namespace
//! prefixes for the query normalizer.

use crate::error::{GlanceError, Result};
use crate::llm::LlmProvider;
use crate::store::{NamedGraphRef, StoreProtocol};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use url::Url;

/// Public SPARQL endpoint of the LamaH-CE knowledge hub.
pub const DEFAULT_ENDPOINT: &str = "https://sparql.knowledgehub.test.n4e.geo.tu-dresden.de/";

/// Default location of a locally running relay.
pub const DEFAULT_RELAY_ENDPOINT: &str = "http://127.0.0.1:8000/run_sparql/";

/// Graph holding the LamaH-CE observations.
pub const DEFAULT_GRAPH: &str = "http://hydroturtle/LamahCE";

/// Main configuration structure for rdf-glance.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Named stores.
    #[serde(default)]
    pub stores: HashMap<String, StoreConfig>,

    /// Additional `prefix = "namespace"` pairs the normalizer may inject.
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "openai", "ollama" or "mock". Anything else fails at load time.
    #[serde(default)]
    pub provider: LlmProvider,

    /// Model name (e.g., "gpt-4o", "llama3.2:3b").
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// SPARQL store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Endpoint URL (the SPARQL endpoint itself, or the relay URL).
    pub endpoint: Option<String>,

    /// Default named graph queries are scoped to.
    pub graph: Option<String>,

    /// Wire protocol. Unset means SPARQL 1.1.
    pub protocol: Option<StoreProtocol>,

    /// Request timeout in seconds.
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            graph: None,
            protocol: None,
            timeout_secs: default_store_timeout(),
        }
    }
}

impl StoreConfig {
    /// Merges another config into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &StoreConfig) {
        if other.endpoint.is_some() {
            self.endpoint = other.endpoint.clone();
        }
        if other.graph.is_some() {
            self.graph = other.graph.clone();
        }
        if other.protocol.is_some() {
            self.protocol = other.protocol;
        }
        if other.timeout_secs != default_store_timeout() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// Returns the wire protocol, defaulting to SPARQL 1.1.
    pub fn protocol(&self) -> StoreProtocol {
        self.protocol.unwrap_or_default()
    }

    /// Fills unset fields from the environment, then from built-in defaults.
    ///
    /// Reads `SPARQL_ENDPOINT` (or `SPARQL_BACKEND_URL` for the relay protocol)
    /// and `NAMED_GRAPH_URI`.
    pub fn apply_env_defaults(&mut self) {
        if self.endpoint.is_none() {
            self.endpoint = match self.protocol() {
                StoreProtocol::Sparql => std::env::var("SPARQL_ENDPOINT")
                    .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
                StoreProtocol::Relay => std::env::var("SPARQL_BACKEND_URL")
                    .unwrap_or_else(|_| DEFAULT_RELAY_ENDPOINT.to_string()),
            }
            .into();
        }
        if self.graph.is_none() {
            self.graph =
                Some(std::env::var("NAMED_GRAPH_URI").unwrap_or_else(|_| DEFAULT_GRAPH.to_string()));
        }
    }

    /// Returns the validated endpoint URL.
    pub fn endpoint_url(&self) -> Result<Url> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| GlanceError::config("Store endpoint is required"))?;

        let url = Url::parse(endpoint)
            .map_err(|e| GlanceError::config(format!("Invalid endpoint URL '{endpoint}': {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GlanceError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        Ok(url)
    }

    /// Returns the validated default graph.
    pub fn graph_ref(&self) -> Result<NamedGraphRef> {
        let graph = self
            .graph
            .as_deref()
            .ok_or_else(|| GlanceError::config("Store graph is required"))?;
        NamedGraphRef::parse(graph)
    }

    /// Returns a display string for log lines.
    pub fn display_string(&self) -> String {
        let endpoint = self.endpoint.as_deref().unwrap_or("unset");
        let graph = self.graph.as_deref().unwrap_or("unset");
        format!("<{graph}> @ {endpoint} ({})", self.protocol())
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rdf-glance")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GlanceError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            GlanceError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named store, or the default store if name is None.
    pub fn get_store(&self, name: Option<&str>) -> Option<&StoreConfig> {
        let key = name.unwrap_or("default");
        self.stores.get(key)
    }

    /// Resolves the store to use.
    ///
    /// Precedence: `overrides` (from the command line), then the named store,
    /// then the default store, then environment variables and built-in defaults.
    pub fn resolve_store(&self, name: Option<&str>, overrides: &StoreConfig) -> Result<StoreConfig> {
        let mut store = match name {
            Some(name) => self.get_store(Some(name)).cloned().ok_or_else(|| {
                GlanceError::config(format!("Store '{}' not found in config file", name))
            })?,
            None => self.get_store(None).cloned().unwrap_or_default(),
        };

        store.merge(overrides);
        store.apply_env_defaults();

        store.endpoint_url()?;
        store.graph_ref()?;

        Ok(store)
    }
}
