//! End-to-end pipeline tests with the mock LLM and mock store.

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rdf_glance::error::Result;
use rdf_glance::llm::{LlmService, MockLlmClient};
use rdf_glance::pipeline::{
    count_delimiters, run_query, FailureKind, Outcome, Pipeline, PipelineConfig, QueryGenerator,
    Stage,
};
use rdf_glance::store::{FailingSparqlExecutor, MockSparqlExecutor, NamedGraphRef, SparqlExecutor};
use serde_json::json;

const GRAPH: &str = "http://hydroturtle/LamahCE";

fn graph() -> NamedGraphRef {
    NamedGraphRef::parse(GRAPH).unwrap()
}

fn pipeline_with(llm: MockLlmClient, executor: Arc<dyn SparqlExecutor>) -> Pipeline {
    let service = Arc::new(LlmService::new(Box::new(llm)));
    Pipeline::new(
        PipelineConfig::new(graph()),
        service.clone(),
        executor,
        service,
    )
}

fn sensor_count() -> serde_json::Value {
    json!({
        "head": {"vars": ["count"]},
        "results": {"bindings": [{"count": {
            "type": "typed-literal",
            "datatype": "http://www.w3.org/2001/XMLSchema#integer",
            "value": "859"
        }}]}
    })
}

/// Generator that always returns the same text.
struct CannedGenerator(&'static str);

#[async_trait]
impl QueryGenerator for CannedGenerator {
    async fn generate(&self, _question: &str, _graph: &NamedGraphRef) -> Result<String> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn test_unscoped_unclosed_query_end_to_end() {
    let executor = Arc::new(MockSparqlExecutor::new().with_envelope(sensor_count()));
    let explainer = Arc::new(LlmService::new(Box::new(MockLlmClient::new())));
    let pipeline = Pipeline::new(
        PipelineConfig::new(graph()),
        Arc::new(CannedGenerator("SELECT ?x WHERE { ?x a sosa:Sensor .")),
        executor.clone(),
        explainer,
    );

    let answer = pipeline.answer("Which sensors exist?", &graph()).await;

    let (opens, closes) = count_delimiters(&answer.query);
    assert_eq!(opens, closes);
    assert_eq!(answer.query.matches(&format!("GRAPH <{GRAPH}>")).count(), 1);
    assert_eq!(answer.outcome, Outcome::Done { explanation_error: None });
    assert!(!answer.query.is_empty());
    assert!(!answer.formatted_answer.is_empty());
    assert!(!answer.explanation.is_empty());

    // The store only ever saw the repaired text
    assert_eq!(executor.received_queries(), vec![answer.query.clone(), answer.query]);
}

#[tokio::test]
async fn test_sensor_count_end_to_end() {
    let executor = Arc::new(MockSparqlExecutor::new().with_envelope(sensor_count()));
    let pipeline = pipeline_with(MockLlmClient::new(), executor.clone());

    let answer = pipeline
        .answer("How many sensors are in the dataset?", &graph())
        .await;

    assert_eq!(
        answer.query,
        "PREFIX sosa: <http://www.w3.org/ns/sosa/>\nSELECT (COUNT(*) AS ?count)\nWHERE { GRAPH <http://hydroturtle/LamahCE> {\n  ?sensor a sosa:Sensor .\n} }"
    );
    assert_eq!(answer.formatted_answer, "859");
    assert_eq!(answer.explanation, "The knowledge graph answered: 859");
    assert_eq!(answer.outcome, Outcome::Done { explanation_error: None });

    // Probe and final execution both saw the repaired query
    assert_eq!(executor.received_queries(), vec![answer.query.clone(), answer.query]);
}

#[tokio::test]
async fn test_station_location_rows() {
    let envelope = json!({
        "head": {"vars": ["geomObj"]},
        "results": {"bindings": [
            {"geomObj": {"type": "literal", "value": "POINT(11.3167 47.6578)"}}
        ]}
    });
    let pipeline = pipeline_with(
        MockLlmClient::new(),
        Arc::new(MockSparqlExecutor::new().with_envelope(envelope)),
    );

    let answer = pipeline
        .answer("Where is the 'Schlehdorf' gauging station located?", &graph())
        .await;

    assert_eq!(answer.formatted_answer, "POINT(11.3167 47.6578)");
    assert!(answer.query.contains("GRAPH <http://hydroturtle/LamahCE>"));
    assert_eq!(answer.query.matches("PREFIX geo:").count(), 1);
}

#[tokio::test]
async fn test_ask_query_answers_yes() {
    let pipeline = pipeline_with(
        MockLlmClient::new(),
        Arc::new(MockSparqlExecutor::new().with_envelope(json!({"boolean": true}))),
    );

    let answer = pipeline.answer("Are there any observations?", &graph()).await;

    assert_eq!(answer.formatted_answer, "Yes");
    assert!(answer.query.starts_with("PREFIX sosa:"));
    assert!(answer.query.contains("ASK { GRAPH <http://hydroturtle/LamahCE> {"));
}

#[tokio::test]
async fn test_multi_variable_rows_keep_order() {
    let envelope = json!({
        "head": {"vars": ["name", "area"]},
        "results": {"bindings": [
            {"name": {"type": "literal", "value": "Schlehdorf"}, "area": {"type": "literal", "value": "704"}},
            {"name": {"type": "literal", "value": "Mittenwald"}, "area": {"type": "literal", "value": "404"}}
        ]}
    });
    let llm = MockLlmClient::new().with_response(
        "catchment",
        "```sparql\nSELECT ?name ?area WHERE { ?s schema:name ?name ; n4e_hyd:area ?area }\n```",
    );
    let pipeline = pipeline_with(llm, Arc::new(MockSparqlExecutor::new().with_envelope(envelope)));

    let answer = pipeline.answer("List catchment areas", &graph()).await;

    assert_eq!(answer.formatted_answer, "Schlehdorf - 704\nMittenwald - 404");
    assert_eq!(answer.row_count, 2);
    assert!(answer.query.contains("PREFIX n4e_hyd:"));
    assert!(answer.query.contains("PREFIX schema:"));
}

#[tokio::test]
async fn test_probe_rejection_is_reported() {
    let executor = Arc::new(
        MockSparqlExecutor::new().then_respond(json!({"error": "Virtuoso 37000 Error SP030: syntax error"})),
    );
    let pipeline = pipeline_with(MockLlmClient::new(), executor.clone());

    let answer = pipeline.answer("How many sensors?", &graph()).await;

    assert_eq!(answer.formatted_answer, "Error: Invalid SPARQL query.");
    assert!(answer.explanation.contains("SP030"));
    assert!(!answer.query.is_empty());
    match answer.outcome {
        Outcome::Failed { stage, kind, .. } => {
            assert_eq!(stage, Stage::Probe);
            assert_eq!(kind, FailureKind::ExecutorFault);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(executor.received_queries().len(), 1);
}

#[tokio::test]
async fn test_prose_response_fails_validation() {
    let executor = Arc::new(MockSparqlExecutor::new());
    let pipeline = pipeline_with(MockLlmClient::new(), executor.clone());

    let answer = pipeline.answer("What is the meaning of life?", &graph()).await;

    // No braces, so nothing could be scoped
    assert_eq!(answer.failed_stage(), Some(Stage::Validation));
    assert!(executor.received_queries().is_empty());
}

#[tokio::test]
async fn test_llm_down_fails_generation() {
    let pipeline = pipeline_with(
        MockLlmClient::failing("connection refused"),
        Arc::new(MockSparqlExecutor::new()),
    );

    let answer = pipeline.answer("How many sensors?", &graph()).await;

    assert_eq!(answer.formatted_answer, "Error: Query generation failed.");
    assert_eq!(answer.query, "");
    assert_eq!(answer.failed_stage(), Some(Stage::Generation));
}

#[tokio::test]
async fn test_store_down_fails_probe() {
    let pipeline = pipeline_with(
        MockLlmClient::new(),
        Arc::new(FailingSparqlExecutor::new("connection refused")),
    );

    let answer = pipeline.answer("How many sensors?", &graph()).await;

    assert_eq!(answer.failed_stage(), Some(Stage::Probe));
    assert!(answer.explanation.contains("connection refused"));
}

#[tokio::test]
async fn test_empty_result_short_circuits() {
    let pipeline = pipeline_with(
        MockLlmClient::new(),
        Arc::new(MockSparqlExecutor::empty()),
    );

    let answer = pipeline.answer("How many sensors?", &graph()).await;

    assert_eq!(answer.outcome, Outcome::NoResults);
    assert_eq!(answer.formatted_answer, "No results found for the query.");
    assert_eq!(
        answer.explanation,
        "No explanation available because no results were retrieved."
    );
}

#[tokio::test]
async fn test_batch_answers_in_order() {
    let pipeline = pipeline_with(
        MockLlmClient::new(),
        Arc::new(MockSparqlExecutor::new().with_envelope(sensor_count())),
    );
    let questions = vec![
        "How many sensors?".to_string(),
        "What is the meaning of life?".to_string(),
        "How many sensors are there?".to_string(),
    ];

    let answers = pipeline.answer_all(&questions, &graph(), 2).await;

    assert_eq!(answers.len(), 3);
    assert!(answers[0].is_success());
    assert!(!answers[1].is_success());
    assert!(answers[2].is_success());
    assert_eq!(answers[1].question, "What is the meaning of life?");
}

#[tokio::test]
async fn test_direct_query() {
    let executor = MockSparqlExecutor::new().with_envelope(sensor_count());

    let answer = run_query(
        &executor,
        "SELECT (COUNT(*) AS ?count) WHERE { GRAPH <http://hydroturtle/LamahCE> { ?s a ?t } }",
    )
    .await;

    assert_eq!(answer.formatted_answer, "859");
    assert!(answer.is_success());
    assert_eq!(executor.received_queries().len(), 1);
}

#[tokio::test]
async fn test_answer_json_shape() {
    let pipeline = pipeline_with(
        MockLlmClient::new(),
        Arc::new(MockSparqlExecutor::new().with_envelope(sensor_count())),
    );

    let answer = pipeline.answer_default("How many sensors?").await;
    let json = serde_json::to_value(&answer).unwrap();

    assert_eq!(json["formatted_answer"], "859");
    assert_eq!(json["outcome"]["state"], "done");
    assert!(json["query"].as_str().unwrap().contains("GRAPH"));
}
