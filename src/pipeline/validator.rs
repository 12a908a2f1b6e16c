//! Structural query validation.
//!
//! A cheap gate in front of the store: it catches output no amount of
//! normalization could repair without contacting the endpoint.

use serde::Serialize;

use crate::pipeline::normalizer::{count_delimiters, has_graph_scope};
use crate::store::NamedGraphRef;

/// Reason reported for an empty query.
pub const EMPTY_QUERY: &str = "empty query";

/// Reason reported when `{` and `}` counts differ.
pub const MISMATCHED_DELIMITERS: &str = "mismatched delimiters";

/// Reason reported when a generated query lost its `GRAPH` clause.
pub const MISSING_GRAPH_SCOPE: &str = "missing graph scope";

/// Outcome of a validation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum ValidationOutcome {
    Valid,
    Invalid(String),
}

impl ValidationOutcome {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid(reason.into())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}

/// Checks that the text is non-empty and its braces balance.
pub fn validate_syntax(query: &str) -> ValidationOutcome {
    if query.trim().is_empty() {
        return ValidationOutcome::invalid(EMPTY_QUERY);
    }

    let (opens, closes) = count_delimiters(query);
    if opens != closes {
        return ValidationOutcome::invalid(MISMATCHED_DELIMITERS);
    }

    ValidationOutcome::Valid
}

/// Runs [`validate_syntax`] and then requires a `GRAPH <graph>` clause.
///
/// Used for generated queries, which must never reach the store unscoped.
pub fn validate_scoped(query: &str, graph: &NamedGraphRef) -> ValidationOutcome {
    match validate_syntax(query) {
        ValidationOutcome::Valid if !has_graph_scope(query, graph) => {
            ValidationOutcome::invalid(MISSING_GRAPH_SCOPE)
        }
        outcome => outcome,
    }
}
