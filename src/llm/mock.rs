//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{GlanceError, Result};
use crate::llm::types::{ChatRequest, Purpose};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit testing without making real API calls. Custom patterns only
/// answer query generation requests; explanation requests get an echo of the
/// answer back.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every request fails with this message.
    failure: Option<String>,
    /// System prompts seen so far, shared between clones.
    system_prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock client whose every request fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns the system prompt of the most recent request, if it had one.
    pub fn last_system_prompt(&self) -> Option<String> {
        self.system_prompts
            .lock()
            .ok()
            .and_then(|prompts| prompts.last().cloned())
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Echoes the answer out of an explanation request.
    fn mock_explanation(input: &str) -> String {
        let answer = input
            .split_once("Answer:")
            .map(|(_, a)| a.split("Explanation:").next().unwrap_or(a).trim())
            .unwrap_or_default();
        format!("The knowledge graph answered: {answer}")
    }

    /// Generates a mock query response based on the question.
    fn mock_query(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("gauging station") {
            return "```sparql\nPREFIX geo: <http://www.opengis.net/ont/geosparql#>\nPREFIX schema: <https://schema.org/>\n\nSELECT ?geomObj\nWHERE {\n  ?sensor schema:name \"Schlehdorf\" ;\n          geo:hasGeometry ?geom .\n  ?geom geo:asWKT ?geomObj .\n}\n```".to_string();
        }

        if input_lower.contains("how many") && input_lower.contains("sensor") {
            return "```sparql\nSELECT (COUNT(?sensor) AS ?sensorCount)\nWHERE {\n  ?sensor a sosa:Sensor .\n}\n```".to_string();
        }

        if input_lower.contains("any observations") {
            return "```sparql\nPREFIX sosa: <http://www.w3.org/ns/sosa/>\nASK { ?obs a sosa:Observation }\n```".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }

}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        if let Some(ref message) = self.failure {
            return Err(GlanceError::llm(message.clone()));
        }

        if let (Some(system), Ok(mut prompts)) =
            (request.system_prompt(), self.system_prompts.lock())
        {
            prompts.push(system.to_string());
        }

        let input = request.user_input();
        Ok(match request.purpose {
            Purpose::QueryGeneration => self.mock_query(input),
            Purpose::Explanation => Self::mock_explanation(input),
        })
    }
}
