//! Result set types for SPARQL query responses.
//!
//! Mirrors the SPARQL 1.1 JSON results format: an envelope is either
//! `{"boolean": true}` for ASK queries or `{"head": ..., "results": {"bindings": [...]}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GlanceError, Result};

/// The kind of RDF term in a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    /// Virtuoso still emits the SPARQL XML-era `typed-literal`.
    TypedLiteral,
    Bnode,
    #[serde(other)]
    Other,
}

/// A single bound value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Term {
    /// Creates a URI term.
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    /// Creates a plain literal term.
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    /// Creates a typed literal term.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            kind: TermKind::TypedLiteral,
            value: value.into(),
            datatype: Some(datatype.into()),
            lang: None,
        }
    }
}

/// One solution: variable name to term, in the order the store returned them.
pub type Row = Vec<(String, Term)>;

/// Variable bindings returned by a SELECT query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    /// Projected variable names from the response head (may be empty).
    pub vars: Vec<String>,
    pub rows: Vec<Row>,
}

/// A parsed query result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSet {
    /// Outcome of an ASK query.
    Boolean(bool),
    /// Solutions of a SELECT query.
    Bindings(Bindings),
}

impl ResultSet {
    /// Parses a result envelope.
    ///
    /// Relay responses of the form `{"error": "..."}` and envelopes carrying
    /// neither a `boolean` nor a `results.bindings` field are rejected.
    pub fn from_envelope(envelope: &Value) -> Result<Self> {
        if let Some(error) = envelope.get("error") {
            let message = error
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| error.to_string());
            return Err(GlanceError::query(message));
        }

        if let Some(boolean) = envelope.get("boolean") {
            return boolean
                .as_bool()
                .map(Self::Boolean)
                .ok_or_else(|| GlanceError::query("'boolean' field is not a boolean"));
        }

        let bindings = envelope
            .get("results")
            .and_then(|r| r.get("bindings"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                GlanceError::query("Response is missing a results/bindings or boolean field")
            })?;

        let vars = envelope
            .get("head")
            .and_then(|h| h.get("vars"))
            .and_then(Value::as_array)
            .map(|vars| {
                vars.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let rows = bindings
            .iter()
            .enumerate()
            .map(|(i, binding)| parse_row(i, binding))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::Bindings(Bindings { vars, rows }))
    }

    /// Number of solutions; an ASK result counts as one.
    pub fn row_count(&self) -> usize {
        match self {
            Self::Boolean(_) => 1,
            Self::Bindings(b) => b.rows.len(),
        }
    }

    /// Returns true for a SELECT result with no solutions.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Bindings(b) if b.rows.is_empty())
    }
}

fn parse_row(index: usize, binding: &Value) -> Result<Row> {
    let object = binding
        .as_object()
        .ok_or_else(|| GlanceError::query(format!("Binding {index} is not an object")))?;

    object
        .iter()
        .map(|(var, term)| {
            serde_json::from_value::<Term>(term.clone())
                .map(|t| (var.clone(), t))
                .map_err(|e| {
                    GlanceError::query(format!("Binding {index} has malformed term '{var}': {e}"))
                })
        })
        .collect()
}
