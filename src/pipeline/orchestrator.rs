//! Pipeline orchestration.
//!
//! Drives one question through generation, normalization, validation,
//! probing, execution, formatting and explanation. Every stage fault is turned
//! into a terminal [`Answer`]; [`Pipeline::answer`] and [`run_query`] never fail.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use super::{
    format_results, validate_scoped, validate_syntax, AnswerExplainer, ExecutionProber,
    Normalizer, QueryGenerator, ValidationOutcome,
};
use crate::store::{NamedGraphRef, SparqlExecutor};

const INVALID_QUERY: &str = "Error: Invalid SPARQL query.";
const GENERATION_FAILED: &str = "Error: Query generation failed.";
const EXECUTION_FAILED: &str = "Error: Query execution failed.";
const NO_RESULTS: &str = "No results found for the query.";
const NO_RESULTS_EXPLANATION: &str = "No explanation available because no results were retrieved.";
const DIRECT_QUERY_EXPLANATION: &str = "No explanation requested for a direct query.";

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Generation,
    Normalization,
    Validation,
    Probe,
    Execution,
    Formatting,
    Explanation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Normalization => "normalization",
            Self::Validation => "validation",
            Self::Probe => "probe",
            Self::Execution => "execution",
            Self::Formatting => "formatting",
            Self::Explanation => "explanation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The generator was unreachable or errored.
    GenerationFault,
    /// The normalized query was empty, unbalanced or unscoped.
    StructuralInvalid,
    /// The store rejected the query during probing or execution.
    ExecutorFault,
}

impl FailureKind {
    fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Generation => Self::GenerationFault,
            Stage::Validation => Self::StructuralInvalid,
            _ => Self::ExecutorFault,
        }
    }
}

/// Terminal state of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Outcome {
    /// Results were produced. `explanation_error` is set when only the
    /// explanation could not be obtained.
    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        explanation_error: Option<String>,
    },
    /// The query ran and matched nothing.
    NoResults,
    Failed {
        stage: Stage,
        kind: FailureKind,
        reason: String,
    },
}

/// The result of answering one question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    /// The query as last seen by the pipeline, possibly unrepaired.
    pub query: String,
    /// Rendered results or an error description.
    pub formatted_answer: String,
    /// Explanation or a description of why none is available.
    pub explanation: String,
    pub outcome: Outcome,
    pub row_count: usize,
    pub duration_ms: u64,
}

impl Answer {
    /// Returns true if results were produced.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Done { .. })
    }

    /// Returns the failing stage, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self.outcome {
            Outcome::Failed { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Static pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Graph used when the caller does not name one.
    pub default_graph: NamedGraphRef,
    pub normalizer: Normalizer,
}

impl PipelineConfig {
    pub fn new(default_graph: NamedGraphRef) -> Self {
        Self {
            default_graph,
            normalizer: Normalizer::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// The question answering pipeline.
///
/// Holds no per-request state, so one instance can serve concurrent requests.
pub struct Pipeline {
    config: PipelineConfig,
    generator: Arc<dyn QueryGenerator>,
    executor: Arc<dyn SparqlExecutor>,
    explainer: Arc<dyn AnswerExplainer>,
}

/// Per-request context used to build the final [`Answer`].
struct Request<'a> {
    question: &'a str,
    start: Instant,
}

impl Request<'_> {
    fn finish(
        &self,
        query: String,
        formatted_answer: impl Into<String>,
        explanation: impl Into<String>,
        outcome: Outcome,
        row_count: usize,
    ) -> Answer {
        let answer = Answer {
            question: self.question.to_string(),
            query,
            formatted_answer: formatted_answer.into(),
            explanation: explanation.into(),
            outcome,
            row_count,
            duration_ms: self.start.elapsed().as_millis() as u64,
        };

        match &answer.outcome {
            Outcome::Failed { stage, reason, .. } => tracing::warn!(
                stage = %stage,
                reason = %reason,
                duration_ms = answer.duration_ms,
                "Request failed"
            ),
            Outcome::NoResults => tracing::info!(
                duration_ms = answer.duration_ms,
                "Query returned no results"
            ),
            Outcome::Done { explanation_error } => tracing::info!(
                rows = answer.row_count,
                explained = explanation_error.is_none(),
                duration_ms = answer.duration_ms,
                "Request answered"
            ),
        }

        answer
    }

    fn failed(&self, query: String, stage: Stage, reason: String) -> Answer {
        let headline = match stage {
            Stage::Generation => GENERATION_FAILED,
            Stage::Validation | Stage::Probe => INVALID_QUERY,
            _ => EXECUTION_FAILED,
        };
        let outcome = Outcome::Failed {
            stage,
            kind: FailureKind::for_stage(stage),
            reason: reason.clone(),
        };
        self.finish(query, headline, reason, outcome, 0)
    }

    fn no_results(&self, query: String) -> Answer {
        self.finish(query, NO_RESULTS, NO_RESULTS_EXPLANATION, Outcome::NoResults, 0)
    }
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        generator: Arc<dyn QueryGenerator>,
        executor: Arc<dyn SparqlExecutor>,
        explainer: Arc<dyn AnswerExplainer>,
    ) -> Self {
        Self {
            config,
            generator,
            executor,
            explainer,
        }
    }

    pub fn default_graph(&self) -> &NamedGraphRef {
        &self.config.default_graph
    }

    /// Answers `question` against the default graph.
    pub async fn answer_default(&self, question: &str) -> Answer {
        self.answer(question, &self.config.default_graph).await
    }

    /// Answers `question` against `graph`.
    pub async fn answer(&self, question: &str, graph: &NamedGraphRef) -> Answer {
        let request = Request {
            question,
            start: Instant::now(),
        };
        tracing::debug!(graph = %graph, stage = %Stage::Generation, "Answering question");

        let raw = match self.generator.generate(question, graph).await {
            Ok(raw) => raw,
            Err(e) => return request.failed(String::new(), Stage::Generation, e.to_string()),
        };

        tracing::debug!(stage = %Stage::Normalization, raw_len = raw.len());
        let query = self.config.normalizer.normalize(&raw, graph);

        tracing::debug!(stage = %Stage::Validation, query = %query);
        if let ValidationOutcome::Invalid(reason) = validate_scoped(&query, graph) {
            return request.failed(query, Stage::Validation, reason);
        }

        tracing::debug!(stage = %Stage::Probe);
        let prober = ExecutionProber::new(self.executor.as_ref());
        if let ValidationOutcome::Invalid(reason) = prober.probe(&query).await {
            return request.failed(query, Stage::Probe, reason);
        }

        let Some((formatted, rows)) =
            execute_and_format(self.executor.as_ref(), &request, &query).await
        else {
            return request.no_results(query);
        };
        let formatted = match formatted {
            Ok(text) => text,
            Err(reason) => return request.failed(query, Stage::Execution, reason),
        };

        tracing::debug!(stage = %Stage::Explanation);
        match self.explainer.explain(question, &formatted).await {
            Ok(explanation) => request.finish(
                query,
                formatted,
                explanation,
                Outcome::Done {
                    explanation_error: None,
                },
                rows,
            ),
            Err(e) => {
                let fault = e.to_string();
                request.finish(
                    query,
                    formatted,
                    format!("Explanation unavailable: {fault}"),
                    Outcome::Done {
                        explanation_error: Some(fault),
                    },
                    rows,
                )
            }
        }
    }

    /// Answers many questions with at most `concurrency` in flight.
    ///
    /// Answers come back in input order.
    pub async fn answer_all(
        &self,
        questions: &[String],
        graph: &NamedGraphRef,
        concurrency: usize,
    ) -> Vec<Answer> {
        stream::iter(questions)
            .map(|question| self.answer(question, graph))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Runs a user-supplied query without generation, repair or explanation.
pub async fn run_query(executor: &dyn SparqlExecutor, query: &str) -> Answer {
    let request = Request {
        question: "",
        start: Instant::now(),
    };
    let query = query.trim().to_string();

    if let ValidationOutcome::Invalid(reason) = validate_syntax(&query) {
        return request.failed(query, Stage::Validation, reason);
    }

    let Some((formatted, rows)) = execute_and_format(executor, &request, &query).await else {
        return request.no_results(query);
    };
    match formatted {
        Ok(text) => request.finish(
            query,
            text,
            DIRECT_QUERY_EXPLANATION,
            Outcome::Done {
                explanation_error: None,
            },
            rows,
        ),
        Err(reason) => request.failed(query, Stage::Execution, reason),
    }
}

/// Executes and renders the query.
///
/// Returns `None` when the rendering is empty, otherwise the rendering (or
/// the execution fault) with the row count.
async fn execute_and_format(
    executor: &dyn SparqlExecutor,
    request: &Request<'_>,
    query: &str,
) -> Option<(std::result::Result<String, String>, usize)> {
    tracing::debug!(stage = %Stage::Execution);
    let result = match executor.select(query).await {
        Ok(result) => result,
        Err(e) => return Some((Err(e.to_string()), 0)),
    };

    tracing::debug!(
        stage = %Stage::Formatting,
        rows = result.row_count(),
        elapsed_ms = request.start.elapsed().as_millis() as u64
    );
    let formatted = format_results(&result);
    if formatted.trim().is_empty() {
        return None;
    }

    Some((Ok(formatted), result.row_count()))
}
