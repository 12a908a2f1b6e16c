//! Prompt construction for LLM requests.
//!
//! Builds the few-shot query generation prompt and the answer explanation
//! prompt.

use crate::llm::types::Message;
use crate::pipeline::PrefixRule;
use crate::store::NamedGraphRef;

/// System prompt template for query generation.
///
/// `{prefixes}` and `{graph}` are substituted before sending.
const GENERATION_PROMPT_TEMPLATE: &str = r#"You are an expert in querying RDF datasets using SPARQL for the Virtuoso triple store.
Convert the user's question into a correct, well-structured and Virtuoso-compatible SPARQL query.

PREFIXES:
{prefixes}

DATA MODEL:
- Observations are modeled using sosa:Observation.
- The observed property is linked using sosa:observedProperty.
- The result is linked using sosa:hasResult (not sosa:result).
- The numeric value of the result is stored in qudt:numericValue.
- The unit of measurement is stored in qudt:unit.
- The observation result time is associated with sosa:resultTime.
- Spatial data is stored using geo:asWKT.

INSTRUCTIONS:
- Scope every graph pattern inside GRAPH {graph} { ... }.
- Ensure balanced brackets: every "{" has a matching "}".
- Use LIMIT when the question asks for a specific number of results.
- Use COUNT(*) when the question asks for a count.
- For spatial queries use Virtuoso functions: bif:st_x(), bif:st_y(), bif:st_z(),
  bif:st_distance() and bif:st_intersects().

EXAMPLES:

Question: Where is the 'Schlehdorf' gauging station located?
```sparql
PREFIX geo: <http://www.opengis.net/ont/geosparql#>
PREFIX schema: <https://schema.org/>

SELECT ?geomObj ?easting ?northing ?elevation
WHERE {
  GRAPH {graph} {
    ?sensor schema:name "Schlehdorf" ;
            geo:hasGeometry ?geom .
    ?geom geo:asWKT ?geomObj .
    BIND (bif:st_x(?geomObj) AS ?easting)
    BIND (bif:st_y(?geomObj) AS ?northing)
    BIND (bif:st_z(?geomObj) AS ?elevation)
  }
}
```

Question: Which catchment area recorded the highest annual precipitation in 2015?
```sparql
PREFIX sosa: <http://www.w3.org/ns/sosa/>
PREFIX envthes: <http://vocabs.lter-europe.net/EnvThes/>
PREFIX qudt: <https://qudt.org/schema/qudt/>
PREFIX n4e_hyd: <https://nfdi4earth.pages.rwth-aachen.de/knowledgehub/nfdi4earth-ontology/test_hyd#>

SELECT ?catchment (SUM(?precipitation) AS ?totalAnnualPrecipitation) ?unit
WHERE {
  GRAPH {graph} {
    ?obs a sosa:Observation ;
         sosa:observedProperty envthes:30106 ;
         sosa:madeBySensor ?sensor ;
         sosa:resultTime ?resultTime ;
         sosa:hasResult ?result .
    ?result qudt:numericValue ?precipitation ;
            qudt:unit ?unit .
    ?sensor n4e_hyd:monitorsCatchment ?catchment .
    FILTER(YEAR(?resultTime) = 2015)
  }
}
GROUP BY ?catchment ?unit
ORDER BY DESC(?totalAnnualPrecipitation)
LIMIT 1
```

Question: What is the average flow rate at a station?
```sparql
PREFIX sosa: <http://www.w3.org/ns/sosa/>
PREFIX envthes: <http://vocabs.lter-europe.net/EnvThes/>
PREFIX qudt: <https://qudt.org/schema/qudt/>

SELECT (AVG(?flowRate) AS ?averageFlowRate) ?unit
WHERE {
  GRAPH {graph} {
    ?obs a sosa:Observation ;
         sosa:observedProperty envthes:21242 ;
         sosa:hasResult ?result .
    ?result qudt:numericValue ?flowRate ;
            qudt:unit ?unit .
  }
}
GROUP BY ?unit
```

OUTPUT FORMAT:
Return only the SPARQL query wrapped in ```sparql code blocks, without any additional text."#;

/// System prompt for explaining query results.
const EXPLANATION_PROMPT: &str = "You are an expert in SPARQL and semantic web queries. \
Given a question and the answer retrieved from a knowledge graph, explain the answer in simple, \
natural language. Do not invent values that are not in the answer.";

/// Builds the query generation system prompt.
///
/// `prefixes` should be the table the normalizer injects from, so the model
/// sees every namespace a repaired query may declare.
pub fn build_generation_prompt<S: AsRef<str>>(
    graph: &NamedGraphRef,
    prefixes: &[PrefixRule<S>],
) -> String {
    let prefixes = prefixes
        .iter()
        .map(|rule| rule.declaration())
        .collect::<Vec<_>>()
        .join("\n");

    GENERATION_PROMPT_TEMPLATE
        .replace("{prefixes}", &prefixes)
        .replace("{graph}", &graph.bracketed())
}

/// Builds the message list for a query generation request.
pub fn build_generation_messages<S: AsRef<str>>(
    question: &str,
    graph: &NamedGraphRef,
    prefixes: &[PrefixRule<S>],
) -> Vec<Message> {
    vec![
        Message::system(build_generation_prompt(graph, prefixes)),
        Message::user(question),
    ]
}

/// Builds the message list for an explanation request.
pub fn build_explanation_messages(question: &str, answer: &str) -> Vec<Message> {
    vec![
        Message::system(EXPLANATION_PROMPT),
        Message::user(format!("Question: {question}\nAnswer: {answer}\n\nExplanation:")),
    ]
}
