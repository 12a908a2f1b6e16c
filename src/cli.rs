//! Command-line argument parsing for rdf-glance.

use crate::config::StoreConfig;
use crate::error::{GlanceError, Result};
use crate::llm::LlmProvider;
use crate::store::StoreProtocol;
use clap::Parser;
use std::path::PathBuf;

/// Output format for answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Query, answer and explanation as labelled sections.
    #[default]
    Text,
    /// The serialized answer, one JSON document per question.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// What the binary has been asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Answer one natural-language question.
    Ask(String),
    /// Answer every line of a file.
    Batch(PathBuf),
    /// Run a query as given.
    Direct(String),
    /// Run the query stored in a file.
    DirectFile(PathBuf),
}

/// Ask questions of an RDF triple store in plain language.
#[derive(Parser, Debug)]
#[command(name = "rdf-glance")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Question to answer
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Named graph to query (overrides config and NAMED_GRAPH_URI)
    #[arg(short = 'g', long, value_name = "IRI")]
    pub graph: Option<String>,

    /// SPARQL endpoint or relay URL
    #[arg(short = 'e', long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Store protocol: sparql or relay
    #[arg(long, value_name = "PROTOCOL")]
    pub protocol: Option<String>,

    /// Use named store from config
    #[arg(short = 's', long, value_name = "NAME")]
    pub store: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LLM provider to use (openai, ollama or mock)
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<LlmProvider>,

    /// Model name for the LLM provider
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Run this SPARQL query directly, skipping generation
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["sparql_file", "batch", "question"])]
    pub sparql: Option<String>,

    /// Run the SPARQL query in this file directly
    #[arg(long, value_name = "PATH", conflicts_with_all = ["batch", "question"])]
    pub sparql_file: Option<PathBuf>,

    /// Answer every non-empty line of this file
    #[arg(long, value_name = "PATH", conflicts_with = "question")]
    pub batch: Option<PathBuf>,

    /// Questions answered at once in batch mode
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub concurrency: usize,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write logs to the state directory instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the requested mode, or an error if nothing was asked.
    pub fn mode(&self) -> Result<Mode> {
        if let Some(query) = &self.sparql {
            return Ok(Mode::Direct(query.clone()));
        }
        if let Some(path) = &self.sparql_file {
            return Ok(Mode::DirectFile(path.clone()));
        }
        if let Some(path) = &self.batch {
            return Ok(Mode::Batch(path.clone()));
        }
        match self.question.as_deref().map(str::trim) {
            Some(question) if !question.is_empty() => Ok(Mode::Ask(question.to_string())),
            _ => Err(GlanceError::config(
                "No question given. Pass a QUESTION, --batch, --sparql or --sparql-file.",
            )),
        }
    }

    /// Builds store overrides from the command line.
    pub fn store_overrides(&self) -> Result<StoreConfig> {
        let protocol = self
            .protocol
            .as_deref()
            .map(str::parse::<StoreProtocol>)
            .transpose()
            .map_err(GlanceError::config)?;

        Ok(StoreConfig {
            endpoint: self.endpoint.clone(),
            graph: self.graph.clone(),
            protocol,
            ..Default::default()
        })
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns the named store to use, if specified.
    pub fn store_name(&self) -> Option<&str> {
        self.store.as_deref()
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }
}
