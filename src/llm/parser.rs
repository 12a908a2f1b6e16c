//! Response parsing for LLM outputs.
//!
//! Extracts SPARQL from LLM responses that may contain markdown code blocks.

/// Result of parsing an LLM response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Any explanatory text before or after the query.
    pub text: String,
    /// Extracted query, if a code block was found.
    pub query: Option<String>,
}

impl ParsedResponse {
    /// Creates a new parsed response with only text (no query).
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            query: None,
        }
    }

    /// Creates a new parsed response with a query and optional text.
    pub fn with_query(text: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            query: Some(query.into()),
        }
    }

    /// Returns the query if one was fenced, otherwise the whole text.
    ///
    /// Models regularly answer with a bare query and no fence; the normalizer
    /// deals with whatever is left.
    pub fn into_query_text(self) -> String {
        self.query.unwrap_or(self.text)
    }
}

/// Parses an LLM response to extract a query from markdown code blocks.
///
/// Looks for the query in the following formats:
/// - ```sparql ... ```
/// - ``` ... ``` (no language specified)
///
/// If multiple code blocks are found, uses the first one.
/// If no code block is found, returns the full text with no query.
pub fn parse_llm_response(response: &str) -> ParsedResponse {
    if let Some(query) = extract_code_block(response, "sparql") {
        let text = remove_code_block(response, "sparql");
        return ParsedResponse::with_query(text.trim(), query.trim());
    }

    if let Some(query) = extract_code_block(response, "") {
        let text = remove_code_block(response, "");
        return ParsedResponse::with_query(text.trim(), query.trim());
    }

    ParsedResponse::text_only(response.trim())
}

/// Finds the opening fence for `lang`, returning (fence start, content start).
///
/// The language tag is matched case-insensitively. Pass an empty string for
/// `lang` to match blocks without a language specifier.
fn find_fence(text: &str, lang: &str) -> Option<(usize, usize)> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find("```") {
        let start_idx = search_from + offset;
        let after_ticks = start_idx + 3;
        let line_end = text[after_ticks..].find('\n').map(|i| after_ticks + i)?;
        let tag = text[after_ticks..line_end].trim();

        if tag.eq_ignore_ascii_case(lang) {
            return Some((start_idx, line_end + 1));
        }

        // Skip over this block's closing fence before searching again.
        let close = text[line_end..].find("```").map(|i| line_end + i + 3)?;
        search_from = close;
    }

    None
}

/// Extracts content from a markdown code block with the specified language.
fn extract_code_block(text: &str, lang: &str) -> Option<String> {
    let (_, content_start) = find_fence(text, lang)?;
    let end_idx = text[content_start..].find("```")?;
    Some(text[content_start..content_start + end_idx].to_string())
}

/// Removes the first matching code block from the text, returning the remaining text.
fn remove_code_block(text: &str, lang: &str) -> String {
    let Some((start_idx, content_start)) = find_fence(text, lang) else {
        return text.to_string();
    };

    let Some(end_offset) = text[content_start..].find("```") else {
        return text.to_string();
    };

    let end_idx = content_start + end_offset + 3;

    let before = &text[..start_idx];
    let after = &text[end_idx..];

    format!("{}{}", before.trim_end(), after.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sparql_code_block() {
        let response = r#"Here's the query:

```sparql
ASK { ?s ?p ?o }
```

This checks whether the graph has any triples."#;

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.query, Some("ASK { ?s ?p ?o }".to_string()));
        assert!(parsed.text.contains("Here's the query:"));
        assert!(parsed.text.contains("any triples."));
    }

    #[test]
    fn test_extract_generic_code_block() {
        let response = "```\nSELECT (COUNT(*) AS ?count) WHERE { ?s a sosa:Sensor }\n```";

        let parsed = parse_llm_response(response);

        assert_eq!(
            parsed.query,
            Some("SELECT (COUNT(*) AS ?count) WHERE { ?s a sosa:Sensor }".to_string())
        );
    }

    #[test]
    fn test_uppercase_tag() {
        let parsed = parse_llm_response("```SPARQL\nASK {}\n```");
        assert_eq!(parsed.query, Some("ASK {}".to_string()));
    }

    #[test]
    fn test_no_code_block() {
        let response = "SELECT ?s WHERE { ?s ?p ?o } LIMIT 1";

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.query, None);
        assert_eq!(parsed.text, response);
        assert_eq!(parsed.into_query_text(), response);
    }

    #[test]
    fn test_multiple_code_blocks_uses_first() {
        let response = "```sparql\nASK { ?a ?b ?c }\n```\n\nor\n\n```sparql\nASK { ?x ?y ?z }\n```";

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.query, Some("ASK { ?a ?b ?c }".to_string()));
    }

    #[test]
    fn test_sparql_block_preferred_over_generic() {
        let response = "```\nnot a query\n```\n\n```sparql\nASK {}\n```";

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.query, Some("ASK {}".to_string()));
        assert!(parsed.text.contains("not a query"));
    }

    #[test]
    fn test_other_language_is_skipped() {
        let response = "```python\nprint('hi')\n```";

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.query, None);
    }

    #[test]
    fn test_generic_block_after_other_language() {
        let response = "```python\nprint('hi')\n```\n```\nASK {}\n```";

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.query, Some("ASK {}".to_string()));
    }

    #[test]
    fn test_unterminated_fence_falls_back_to_text() {
        let parsed = parse_llm_response("```sparql\nASK { ?s ?p ?o }");
        assert_eq!(parsed.query, None);
        assert_eq!(parsed.into_query_text(), "```sparql\nASK { ?s ?p ?o }");
    }

    #[test]
    fn test_empty_response() {
        let parsed = parse_llm_response("");
        assert_eq!(parsed.query, None);
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn test_whitespace_handling() {
        let parsed = parse_llm_response("  \n  ```sparql\n  ASK {}  \n```  \n  ");
        assert_eq!(parsed.query, Some("ASK {}".to_string()));
    }
}
