//! Normalizer and validator behavior on realistic generator output.

use pretty_assertions::assert_eq;
use rdf_glance::pipeline::{
    count_delimiters, normalize, validate_syntax, Normalizer, ValidationOutcome,
};
use rdf_glance::store::NamedGraphRef;

fn graph() -> NamedGraphRef {
    NamedGraphRef::parse("http://hydroturtle/LamahCE").unwrap()
}

/// Shapes seen from chat models asked for SPARQL.
const GENERATED: &[&str] = &[
    "```sparql\nPREFIX geo: <http://www.opengis.net/ont/geosparql#>\nPREFIX schema: <https://schema.org/>\n\nSELECT ?geomObj\nWHERE {\n  ?sensor schema:name \"Schlehdorf\" ;\n          geo:hasGeometry ?geom .\n  ?geom geo:asWKT ?geomObj .\n}\n```",
    "SELECT (COUNT(?sensor) AS ?sensorCount)\nWHERE {\n  ?sensor a sosa:Sensor .\n}",
    "SELECT ?s ?p ?o WHERE { SELECT ?obs WHERE { ?obs a sosa:Observation . } LIMIT 10 } }",
    "SELECT ?v WHERE {\n  ?obs sosa:hasResult ?r .\n  ?r qudt:numericValue ?v ;\n     qudt:unit unit:M3-PER-SEC .\n",
    "SELECT ?date (AVG(?v) AS ?avg) WHERE { { ?obs sosa:resultTime ?date ; sosa:hasSimpleResult ?v . } } } GROUP BY ?date",
    "ASK { ?s a sosa:Platform }",
    "SELECT * WHERE { ?s ?p ?o FILTER(?o > \"2020-01-01\"^^xsd:date) } ORDER BY ?s",
];

#[test]
fn test_generated_queries_become_valid() {
    for raw in GENERATED {
        let query = normalize(raw, &graph());
        assert_eq!(validate_syntax(&query), ValidationOutcome::Valid, "{raw}\n=>\n{query}");
        assert_eq!(
            query.matches("GRAPH <http://hydroturtle/LamahCE>").count(),
            1,
            "{query}"
        );
        assert!(!query.contains("```"), "{query}");
    }
}

#[test]
fn test_generated_queries_are_stable() {
    for raw in GENERATED {
        let once = normalize(raw, &graph());
        assert_eq!(normalize(&once, &graph()), once);
    }
}

#[test]
fn test_prefixes_declared_once() {
    let query = normalize(GENERATED[3], &graph());

    for prefix in ["sosa", "qudt", "unit"] {
        assert_eq!(
            query.matches(&format!("PREFIX {prefix}:")).count(),
            1,
            "{prefix} in {query}"
        );
    }
    assert!(!query.contains("PREFIX geo:"));
}

#[test]
fn test_declared_prefixes_are_kept() {
    let query = normalize(GENERATED[0], &graph());
    assert_eq!(query.matches("PREFIX geo:").count(), 1);
    assert_eq!(query.matches("PREFIX schema:").count(), 1);
}

#[test]
fn test_validator_before_and_after_repair() {
    let raw = "SELECT * WHERE { { { ?s ?p ?o } }";
    assert_eq!(
        validate_syntax(raw),
        ValidationOutcome::invalid("mismatched delimiters")
    );

    let repaired = normalize(raw, &graph());
    let (opens, closes) = count_delimiters(&repaired);
    assert_eq!(opens, closes);
    assert!(validate_syntax(&repaired).is_valid());
}

#[test]
fn test_configured_prefix_is_injected() {
    let normalizer = Normalizer::new().with_prefix("hyd", "http://example.org/hydrology#");

    let query = normalizer.normalize("SELECT ?x WHERE { ?x a hyd:Gauge }", &graph());

    assert!(query.starts_with("PREFIX hyd: <http://example.org/hydrology#>\n"));
}

#[test]
fn test_other_graph_is_used() {
    let other = NamedGraphRef::parse("https://example.org/graphs/test").unwrap();

    let query = normalize("SELECT ?s WHERE { ?s ?p ?o }", &other);

    assert_eq!(
        query,
        "SELECT ?s WHERE { GRAPH <https://example.org/graphs/test> { ?s ?p ?o } }"
    );
}
