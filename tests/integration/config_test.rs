//! Configuration loading tests.

use pretty_assertions::assert_eq;
use rdf_glance::config::{Config, StoreConfig};
use rdf_glance::pipeline::Normalizer;
use rdf_glance::store::{NamedGraphRef, StoreProtocol};

const CONFIG: &str = r#"
[llm]
provider = "mock"
model = "unused"

[stores.default]
endpoint = "https://sparql.example.org/sparql"
graph = "http://example.org/default"

[stores.relay]
endpoint = "http://127.0.0.1:8000/run_sparql/"
graph = "http://hydroturtle/LamahCE"
protocol = "relay"

[prefixes]
hyd = "http://example.org/hydrology#"
"#;

fn write_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, CONFIG).unwrap();
    path
}

#[test]
fn test_load_and_resolve_named_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(&write_config(&dir)).unwrap();

    let store = config
        .resolve_store(Some("relay"), &StoreConfig::default())
        .unwrap();

    assert_eq!(store.protocol(), StoreProtocol::Relay);
    assert_eq!(
        store.graph_ref().unwrap(),
        NamedGraphRef::parse("http://hydroturtle/LamahCE").unwrap()
    );
}

#[test]
fn test_cli_overrides_win() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(&write_config(&dir)).unwrap();

    let overrides = StoreConfig {
        endpoint: Some("http://localhost:8890/sparql".to_string()),
        ..Default::default()
    };
    let store = config.resolve_store(None, &overrides).unwrap();

    assert_eq!(store.endpoint.as_deref(), Some("http://localhost:8890/sparql"));
    assert_eq!(store.graph.as_deref(), Some("http://example.org/default"));
}

#[test]
fn test_configured_prefixes_reach_normalizer() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(&write_config(&dir)).unwrap();

    let normalizer = config
        .prefixes
        .iter()
        .fold(Normalizer::default(), |n, (prefix, namespace)| {
            n.with_prefix(prefix.as_str(), namespace.as_str())
        });
    let graph = NamedGraphRef::parse("http://example.org/default").unwrap();

    let query = normalizer.normalize("SELECT ?g WHERE { ?g a hyd:Gauge }", &graph);

    assert_eq!(
        query,
        "PREFIX hyd: <http://example.org/hydrology#>\nSELECT ?g WHERE { GRAPH <http://example.org/default> { ?g a hyd:Gauge } }"
    );
}
