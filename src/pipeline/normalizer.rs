//! Query normalization.
//!
//! Rewrites generated SPARQL into a form the store accepts. Each step is a
//! cheap textual patch for a failure shape observed in model output; none of
//! them parse the query. Steps run in a fixed order because later ones rely on
//! earlier ones having run:
//!
//! 1. literal rewrites from [`REWRITE_RULES`]
//! 2. missing `PREFIX` declarations from the prefix table
//! 3. `GRAPH <ref> { ... }` scoping of the first pattern block
//! 4. removal of code fences, bare or tagged `sparql`/`rq`
//! 5. brace rebalancing
//! 6. collapse of a doubled `WHERE { {` with a tripled tail
//!
//! The result is balanced and a second pass over it is a no-op.

use std::sync::OnceLock;

use regex::Regex;

use crate::store::NamedGraphRef;

/// A literal substring rewrite.
///
/// Fires only when `pattern` occurs verbatim in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
    /// Also trim every trailing `}` once the rule fires.
    pub trim_trailing_closers: bool,
}

impl RewriteRule {
    /// Returns true if the rule's precondition holds for `text`.
    pub fn applies(&self, text: &str) -> bool {
        text.contains(self.pattern)
    }

    /// Applies the rule, returning the text unchanged when it does not apply.
    pub fn apply(&self, text: String) -> String {
        if !self.applies(&text) {
            return text;
        }

        let rewritten = text.replace(self.pattern, self.replacement);
        if self.trim_trailing_closers {
            rewritten
                .trim_end_matches(|c: char| c == '}' || c.is_whitespace())
                .to_string()
        } else {
            rewritten
        }
    }
}

/// Known-bad generator idioms and their corrections.
pub const REWRITE_RULES: &[RewriteRule] = &[
    RewriteRule {
        name: "generic-triple-wrapper",
        pattern: "SELECT ?s ?p ?o WHERE {",
        replacement: "",
        trim_trailing_closers: true,
    },
    RewriteRule {
        name: "sensor-count",
        pattern: "SELECT (COUNT(?sensor) AS ?sensorCount)",
        replacement: "SELECT (COUNT(*) AS ?count)",
        trim_trailing_closers: false,
    },
];

/// A namespace the normalizer declares when a query uses its prefix undeclared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule<S = &'static str> {
    pub prefix: S,
    pub namespace: S,
}

impl<S: AsRef<str>> PrefixRule<S> {
    /// True if `text` uses `prefix:` without declaring it.
    pub fn applies(&self, text: &str) -> bool {
        let prefix = self.prefix.as_ref();
        uses_prefix(text, prefix) && !declares_prefix(text, prefix)
    }

    /// The `PREFIX` line this rule injects.
    pub fn declaration(&self) -> String {
        format!("PREFIX {}: <{}>", self.prefix.as_ref(), self.namespace.as_ref())
    }
}

const fn prefix_rule(prefix: &'static str, namespace: &'static str) -> PrefixRule {
    PrefixRule { prefix, namespace }
}

/// Vocabulary prefixes known to the generation prompt.
pub const PREFIX_RULES: &[PrefixRule] = &[
    prefix_rule("sosa", "http://www.w3.org/ns/sosa/"),
    prefix_rule("envthes", "http://vocabs.lter-europe.net/EnvThes/"),
    prefix_rule("qudt", "https://qudt.org/schema/qudt/"),
    prefix_rule("xsd", "http://www.w3.org/2001/XMLSchema#"),
    prefix_rule("unit", "https://qudt.org/vocab/unit/"),
    prefix_rule("schema", "https://schema.org/"),
    prefix_rule("locn", "http://www.w3.org/ns/locn#"),
    prefix_rule("geo", "http://www.opengis.net/ont/geosparql#"),
    prefix_rule(
        "n4e_hyd",
        "https://nfdi4earth.pages.rwth-aachen.de/knowledgehub/nfdi4earth-ontology/test_hyd#",
    ),
];

/// Query normalizer with its rule tables.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rewrites: Vec<RewriteRule>,
    prefixes: Vec<PrefixRule<String>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            rewrites: REWRITE_RULES.to_vec(),
            prefixes: PREFIX_RULES
                .iter()
                .map(|rule| PrefixRule {
                    prefix: rule.prefix.to_string(),
                    namespace: rule.namespace.to_string(),
                })
                .collect(),
        }
    }
}

impl Normalizer {
    /// Creates a normalizer with the built-in rule tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prefix declaration, replacing any existing one for `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let namespace = namespace.into();
        match self.prefixes.iter_mut().find(|rule| rule.prefix == prefix) {
            Some(rule) => rule.namespace = namespace,
            None => self.prefixes.push(PrefixRule { prefix, namespace }),
        }
        self
    }

    /// Returns the rewrite rules in application order.
    pub fn rewrites(&self) -> &[RewriteRule] {
        &self.rewrites
    }

    /// Returns the prefix table in declaration order.
    pub fn prefixes(&self) -> &[PrefixRule<String>] {
        &self.prefixes
    }

    /// Normalizes `raw` for execution against `graph`.
    ///
    /// Never fails. Blank input yields an empty string.
    pub fn normalize(&self, raw: &str, graph: &NamedGraphRef) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        let mut text = raw.to_string();
        for rule in &self.rewrites {
            text = rule.apply(text);
        }
        let text = self.inject_prefixes(text);
        let text = enforce_graph_scope(text, graph);
        let text = strip_markup(&text);
        let text = rebalance_delimiters(text);
        let text = collapse_redundant_nesting(text);

        text.trim().to_string()
    }

    /// Prepends declarations for prefixes that are used but never declared.
    pub fn inject_prefixes(&self, text: String) -> String {
        let missing: Vec<String> = self
            .prefixes
            .iter()
            .filter(|rule| rule.applies(&text))
            .map(|rule| rule.declaration())
            .collect();

        if missing.is_empty() {
            return text;
        }

        format!("{}\n{}", missing.join("\n"), text)
    }
}

/// Normalizes with the built-in rule tables.
pub fn normalize(raw: &str, graph: &NamedGraphRef) -> String {
    Normalizer::default().normalize(raw, graph)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// True if `prefix:local` appears as a prefixed name.
///
/// The occurrence must not be glued to a preceding name or IRI path and must
/// be followed by a local name, so `PREFIX sosa: <...>` itself does not count.
fn uses_prefix(text: &str, prefix: &str) -> bool {
    let needle = format!("{prefix}:");
    text.match_indices(&needle).any(|(idx, _)| {
        let before_ok = text[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !(is_name_char(c) || matches!(c, ':' | '/' | '#' | '.')));
        let after_ok = text[idx + needle.len()..]
            .chars()
            .next()
            .is_some_and(is_name_char);
        before_ok && after_ok
    })
}

/// True if the text contains `PREFIX prefix:` (keyword case-insensitive).
fn declares_prefix(text: &str, prefix: &str) -> bool {
    let needle = format!("{prefix}:");
    text.match_indices(&needle).any(|(idx, _)| {
        let head = text[..idx].trim_end();
        head.len() < idx
            && head.len() >= 6
            && head.is_char_boundary(head.len() - 6)
            && head[head.len() - 6..].eq_ignore_ascii_case("PREFIX")
    })
}

fn where_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bWHERE\s*\{").expect("literal regex is valid"))
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Only known query tags count; anything else glued to a fence is query text.
    RE.get_or_init(|| {
        Regex::new(r"(?i)```(?:(?:sparql|rq)(\s|$))?").expect("literal regex is valid")
    })
}

fn doubled_where_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bWHERE\s*\{(\s*\{)").expect("literal regex is valid"))
}

fn tripled_tail_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\}\s*\}(\s*\})\s*$").expect("literal regex is valid"))
}

/// True if the text already has a `GRAPH <ref>` clause.
pub fn has_graph_scope(text: &str, graph: &NamedGraphRef) -> bool {
    let pattern = format!(r"(?i:\bGRAPH)\s*{}", regex::escape(&graph.bracketed()));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => text.contains(&graph.scope_clause()),
    }
}

/// Counts (opening, closing) braces.
pub fn count_delimiters(text: &str) -> (usize, usize) {
    text.chars().fold((0, 0), |(open, close), c| match c {
        '{' => (open + 1, close),
        '}' => (open, close + 1),
        _ => (open, close),
    })
}

/// Wraps the first pattern block's body in `GRAPH <ref> { ... }`.
///
/// Anchors on the `{` after the first `WHERE`, or on the first `{` when there
/// is no `WHERE` (e.g. `ASK { ... }`). The new closer goes in front of the
/// block's own closer when it has one, otherwise at the end of the text.
fn enforce_graph_scope(text: String, graph: &NamedGraphRef) -> String {
    if has_graph_scope(&text, graph) {
        return text;
    }

    let anchor = match where_block_regex().find(&text) {
        Some(m) => m.end() - 1,
        None => match text.find('{') {
            Some(idx) => idx,
            None => return text,
        },
    };

    let body_start = anchor + 1;
    let opener = format!(" {} {{", graph.scope_clause());

    let mut scoped = String::with_capacity(text.len() + opener.len() + 2);
    scoped.push_str(&text[..body_start]);
    scoped.push_str(&opener);

    match matching_close(&text, anchor) {
        Some(close) => {
            scoped.push_str(&text[body_start..close]);
            scoped.push_str("} ");
            scoped.push_str(&text[close..]);
        }
        None => {
            scoped.push_str(&text[body_start..]);
            scoped.push_str(" }");
        }
    }

    scoped
}

/// Finds the `}` closing the `{` at `open`.
fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes code fences, bare or tagged `sparql`/`rq`.
fn strip_markup(text: &str) -> String {
    fence_regex().replace_all(text, "${1}").trim().to_string()
}

/// Restores equal brace counts.
///
/// Missing closers are appended. Surplus closers are stripped from the tail
/// first; any still left over are removed right to left.
fn rebalance_delimiters(mut text: String) -> String {
    let (opens, closes) = count_delimiters(&text);

    if opens > closes {
        text.push_str(&"}".repeat(opens - closes));
        return text;
    }

    let mut excess = closes - opens;

    while excess > 0 {
        let trimmed_len = text.trim_end().len();
        if !text[..trimmed_len].ends_with('}') {
            break;
        }
        text.truncate(trimmed_len - 1);
        excess -= 1;
    }

    while excess > 0 {
        match text.rfind('}') {
            Some(idx) => {
                text.remove(idx);
                excess -= 1;
            }
            None => break,
        }
    }

    text
}

/// Collapses `WHERE { {` into `WHERE {` together with a `} } }` tail into `} }`.
///
/// The two always go together so the brace counts stay equal.
fn collapse_redundant_nesting(mut text: String) -> String {
    loop {
        let head = doubled_where_regex()
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.range());
        let tail = tripled_tail_regex()
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.range());

        let (Some(head), Some(tail)) = (head, tail) else {
            return text;
        };

        // Tail first so the head range stays valid.
        text.replace_range(tail, "");
        text.replace_range(head, "");
    }
}
