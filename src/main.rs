//! rdf-glance - Ask questions of an RDF triple store in plain language.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rdf_glance::cli::{Cli, Mode, OutputFormat};
use rdf_glance::config::Config;
use rdf_glance::error::GlanceError;
use rdf_glance::llm::{create_client, LlmService};
use rdf_glance::logging;
use rdf_glance::pipeline::{run_query, Answer, Normalizer, Pipeline, PipelineConfig};
use rdf_glance::store::{self, SparqlExecutor};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<GlanceError>() {
            Some(err) => error!("{}: {}", err.category(), err),
            None => error!("{e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mode = cli.mode()?;
    let output = cli.parse_output_format().map_err(GlanceError::config)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // Precedence: CLI, named store, default store, environment, built-in defaults
    let store_config = config.resolve_store(cli.store_name(), &cli.store_overrides()?)?;
    info!("Store: {}", store_config.display_string());

    let graph = store_config.graph_ref()?;
    let executor: Arc<dyn SparqlExecutor> = Arc::from(store::connect(&store_config)?);

    let questions = match mode {
        Mode::Direct(query) => {
            let answer = run_query(executor.as_ref(), &query).await;
            return print_answers(&[answer], output);
        }
        Mode::DirectFile(path) => {
            let query = read_text(&path)?;
            let answer = run_query(executor.as_ref(), &query).await;
            return print_answers(&[answer], output);
        }
        Mode::Ask(question) => vec![question],
        Mode::Batch(path) => read_text(&path)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
    };

    let mut llm_config = config.llm.clone();
    if let Some(provider) = cli.llm {
        llm_config.provider = provider;
    }
    if let Some(model) = &cli.model {
        llm_config.model = model.clone();
    }
    info!("LLM: {} ({})", llm_config.provider, llm_config.model);

    let normalizer = config
        .prefixes
        .iter()
        .fold(Normalizer::default(), |n, (prefix, namespace)| {
            n.with_prefix(prefix.as_str(), namespace.as_str())
        });

    let service = Arc::new(
        LlmService::new(create_client(&llm_config, None)?).with_prefixes(normalizer.prefixes()),
    );

    let pipeline = Pipeline::new(
        PipelineConfig::new(graph.clone()).with_normalizer(normalizer),
        service.clone(),
        executor,
        service,
    );

    info!(questions = questions.len(), concurrency = cli.concurrency, "Answering");
    let answers = pipeline.answer_all(&questions, &graph, cli.concurrency).await;

    print_answers(&answers, output)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_answers(answers: &[Answer], output: OutputFormat) -> anyhow::Result<()> {
    for (i, answer) in answers.iter().enumerate() {
        match output {
            OutputFormat::Json => {
                let json =
                    serde_json::to_string(answer).context("Failed to serialize answer")?;
                println!("{json}");
            }
            OutputFormat::Text => {
                if i > 0 {
                    println!();
                }
                if !answer.question.is_empty() {
                    println!("Question:\n{}\n", answer.question);
                }
                println!("Query:\n{}\n", answer.query);
                println!("Answer:\n{}\n", answer.formatted_answer);
                println!("Explanation:\n{}", answer.explanation);
            }
        }
    }

    Ok(())
}
