//! Store integration tests.
//!
//! Live tests need a reachable endpoint. Set SPARQL_ENDPOINT (and optionally
//! NAMED_GRAPH_URI) to run them.

use rdf_glance::config::StoreConfig;
use rdf_glance::pipeline::ExecutionProber;
use rdf_glance::store::{self, NamedGraphRef, ResultSet, SparqlExecutor, StoreProtocol};

/// Helper to create a client for the live endpoint.
fn get_test_client() -> Option<(Box<dyn SparqlExecutor>, NamedGraphRef)> {
    let endpoint = std::env::var("SPARQL_ENDPOINT").ok()?;
    let mut config = StoreConfig {
        endpoint: Some(endpoint),
        ..Default::default()
    };
    config.apply_env_defaults();

    let graph = config.graph_ref().ok()?;
    let client = store::connect(&config).ok()?;
    Some((client, graph))
}

#[tokio::test]
async fn test_live_ask() {
    let Some((client, graph)) = get_test_client() else {
        eprintln!("Skipping test: SPARQL_ENDPOINT not set");
        return;
    };

    let query = format!("ASK {{ GRAPH {} {{ ?s ?p ?o }} }}", graph.bracketed());
    let result = client.select(&query).await.unwrap();

    assert!(matches!(result, ResultSet::Boolean(_)));
}

#[tokio::test]
async fn test_live_select_limit() {
    let Some((client, graph)) = get_test_client() else {
        eprintln!("Skipping test: SPARQL_ENDPOINT not set");
        return;
    };

    let query = format!(
        "SELECT ?s ?p WHERE {{ GRAPH {} {{ ?s ?p ?o }} }} LIMIT 3",
        graph.bracketed()
    );
    let result = client.select(&query).await.unwrap();

    assert!(result.row_count() <= 3);
    if let ResultSet::Bindings(bindings) = result {
        for row in &bindings.rows {
            let vars: Vec<&str> = row.iter().map(|(var, _)| var.as_str()).collect();
            assert_eq!(vars, vec!["s", "p"]);
        }
    }
}

#[tokio::test]
async fn test_live_probe_rejects_garbage() {
    let Some((client, _graph)) = get_test_client() else {
        eprintln!("Skipping test: SPARQL_ENDPOINT not set");
        return;
    };

    let outcome = ExecutionProber::new(client.as_ref())
        .probe("SELECT WHERE nonsense {")
        .await;

    assert!(!outcome.is_valid());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_store_error() {
    let config = StoreConfig {
        endpoint: Some("http://127.0.0.1:9/sparql".to_string()),
        graph: Some("http://example.org/g".to_string()),
        protocol: Some(StoreProtocol::Relay),
        timeout_secs: 2,
    };
    let client = store::connect(&config).unwrap();

    let err = client.execute("ASK {}").await.unwrap_err();

    assert_eq!(err.category(), "Store Error");
}
