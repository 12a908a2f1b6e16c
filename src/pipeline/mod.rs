//! The question answering pipeline.
//!
//! Turns a natural-language question into a scoped SPARQL query, checks it,
//! runs it and explains the answer. Model and store access sit behind the
//! [`QueryGenerator`], [`AnswerExplainer`] and
//! [`SparqlExecutor`](crate::store::SparqlExecutor) traits so the pipeline can
//! be driven by deterministic fakes.

mod formatter;
mod normalizer;
mod orchestrator;
mod prober;
mod validator;

pub use formatter::{format_results, NO, VALUE_SEPARATOR, YES};
pub use normalizer::{
    count_delimiters, has_graph_scope, normalize, Normalizer, PrefixRule, RewriteRule, PREFIX_RULES,
    REWRITE_RULES,
};
pub use orchestrator::{run_query, Answer, FailureKind, Outcome, Pipeline, PipelineConfig, Stage};
pub use prober::ExecutionProber;
pub use validator::{
    validate_scoped, validate_syntax, ValidationOutcome, EMPTY_QUERY, MISMATCHED_DELIMITERS,
    MISSING_GRAPH_SCOPE,
};

use async_trait::async_trait;

use crate::error::Result;
use crate::store::NamedGraphRef;

/// Produces candidate query text for a question.
#[async_trait]
pub trait QueryGenerator: Send + Sync {
    /// Returns raw query text. It may still contain markup or be malformed.
    async fn generate(&self, question: &str, graph: &NamedGraphRef) -> Result<String>;
}

/// Produces a natural-language explanation of an answer.
#[async_trait]
pub trait AnswerExplainer: Send + Sync {
    async fn explain(&self, question: &str, answer: &str) -> Result<String>;
}
