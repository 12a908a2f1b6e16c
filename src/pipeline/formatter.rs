//! Result rendering.

use crate::store::{ResultSet, Term};

/// Rendering of a true boolean result.
pub const YES: &str = "Yes";

/// Rendering of a false boolean result.
pub const NO: &str = "No";

/// Separator between values within one row.
pub const VALUE_SEPARATOR: &str = " - ";

/// Renders a result set as plain text.
///
/// Booleans become `Yes`/`No`. Binding rows become one line each, with the
/// row's values joined in variable order. No rows renders as an empty string.
pub fn format_results(result: &ResultSet) -> String {
    match result {
        ResultSet::Boolean(true) => YES.to_string(),
        ResultSet::Boolean(false) => NO.to_string(),
        ResultSet::Bindings(bindings) => bindings
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(_, term)| render_term(term))
                    .collect::<Vec<_>>()
                    .join(VALUE_SEPARATOR)
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_term(term: &Term) -> &str {
    term.value.as_str()
}
