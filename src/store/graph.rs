//! Named graph references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GlanceError, Result};

/// An absolute IRI naming the graph a query is scoped to.
///
/// Always valid once constructed: it parses as an absolute URL and contains no
/// characters that would break out of an `<...>` IRI reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamedGraphRef(String);

impl NamedGraphRef {
    /// Parses and validates a graph IRI.
    pub fn parse(iri: &str) -> Result<Self> {
        let iri = iri.trim();
        let iri = iri
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(iri);

        if iri.is_empty() {
            return Err(GlanceError::config("Graph IRI must not be empty"));
        }

        if let Some(c) = iri
            .chars()
            .find(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}'))
        {
            return Err(GlanceError::config(format!(
                "Graph IRI '{iri}' contains invalid character {c:?}"
            )));
        }

        Url::parse(iri)
            .map_err(|e| GlanceError::config(format!("Invalid graph IRI '{iri}': {e}")))?;

        Ok(Self(iri.to_string()))
    }

    /// Returns the bare IRI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the IRI in angle brackets, as written in query text.
    pub fn bracketed(&self) -> String {
        format!("<{}>", self.0)
    }

    /// Returns the graph scoping clause head, e.g. `GRAPH <http://example.org/g>`.
    pub fn scope_clause(&self) -> String {
        format!("GRAPH {}", self.bracketed())
    }
}

impl fmt::Display for NamedGraphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NamedGraphRef {
    type Err = GlanceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NamedGraphRef {
    type Error = GlanceError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<NamedGraphRef> for String {
    fn from(value: NamedGraphRef) -> Self {
        value.0
    }
}
