//! LLM service for query generation and answer explanation.
//!
//! Wraps an [`LlmClient`] so a single chat model can serve as both the
//! pipeline's [`QueryGenerator`] and its [`AnswerExplainer`].

use std::time::Instant;

use async_trait::async_trait;

use super::{
    build_explanation_messages, build_generation_messages, parse_llm_response, ChatRequest,
    LlmClient,
};
use crate::error::Result;
use crate::pipeline::{AnswerExplainer, Normalizer, PrefixRule, QueryGenerator};
use crate::store::NamedGraphRef;

/// LLM-backed generator and explainer.
pub struct LlmService {
    client: Box<dyn LlmClient>,
    prefixes: Vec<PrefixRule<String>>,
}

impl LlmService {
    /// Creates a new LLM service that advertises the built-in prefix table.
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            prefixes: Normalizer::default().prefixes().to_vec(),
        }
    }

    /// Replaces the prefix table listed in the generation prompt.
    pub fn with_prefixes(mut self, prefixes: &[PrefixRule<String>]) -> Self {
        self.prefixes = prefixes.to_vec();
        self
    }
}

#[async_trait]
impl QueryGenerator for LlmService {
    async fn generate(&self, question: &str, graph: &NamedGraphRef) -> Result<String> {
        let start = Instant::now();
        tracing::debug!(
            question_len = question.len(),
            graph = %graph,
            "Sending generation request to LLM"
        );

        let request =
            ChatRequest::generation(build_generation_messages(question, graph, &self.prefixes));
        let response = self.client.complete(&request).await?;

        let parsed = parse_llm_response(&response);
        let fenced = parsed.query.is_some();
        let query = parsed.into_query_text();

        tracing::debug!(
            llm_duration_ms = start.elapsed().as_millis(),
            response_len = response.len(),
            query_len = query.len(),
            fenced,
            "Received generated query"
        );

        Ok(query)
    }
}

#[async_trait]
impl AnswerExplainer for LlmService {
    async fn explain(&self, question: &str, answer: &str) -> Result<String> {
        let start = Instant::now();

        let request = ChatRequest::explanation(build_explanation_messages(question, answer));
        let explanation = self.client.complete(&request).await?;

        tracing::debug!(
            llm_duration_ms = start.elapsed().as_millis(),
            explanation_len = explanation.len(),
            "Received answer explanation"
        );

        Ok(explanation.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    fn graph() -> NamedGraphRef {
        NamedGraphRef::parse("http://hydroturtle/LamahCE").unwrap()
    }

    #[tokio::test]
    async fn test_generate_strips_fence() {
        let service = LlmService::new(Box::new(MockLlmClient::new()));

        let query = service
            .generate("How many sensors are there?", &graph())
            .await
            .unwrap();

        assert!(query.starts_with("SELECT (COUNT(?sensor) AS ?sensorCount)"));
        assert!(!query.contains("```"));
    }

    #[tokio::test]
    async fn test_generate_unfenced_response_is_kept() {
        let service = LlmService::new(Box::new(
            MockLlmClient::new().with_response("bare", "ASK { ?s ?p ?o }"),
        ));

        let query = service.generate("bare query please", &graph()).await.unwrap();

        assert_eq!(query, "ASK { ?s ?p ?o }");
    }

    #[tokio::test]
    async fn test_generate_propagates_client_error() {
        let service = LlmService::new(Box::new(MockLlmClient::failing("offline")));

        let err = service.generate("anything", &graph()).await.unwrap_err();

        assert_eq!(err.category(), "LLM Error");
    }

    #[tokio::test]
    async fn test_generation_prompt_uses_configured_prefixes() {
        let client = MockLlmClient::new();
        let service = LlmService::new(Box::new(client.clone())).with_prefixes(&[PrefixRule {
            prefix: "ex".to_string(),
            namespace: "http://example.org/ns#".to_string(),
        }]);

        service.generate("How many sensors are there?", &graph()).await.unwrap();

        let prompt = client.last_system_prompt().unwrap();
        assert!(prompt.contains("PREFIX ex: <http://example.org/ns#>"));
        assert!(!prompt.contains("PREFIX sosa:"));
    }

    #[tokio::test]
    async fn test_explain() {
        let service = LlmService::new(Box::new(MockLlmClient::new()));

        let explanation = service.explain("How many sensors?", "859").await.unwrap();

        assert_eq!(explanation, "The knowledge graph answered: 859");
    }
}
