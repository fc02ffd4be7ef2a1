//! Pipeline orchestrator binary: answers every RAG and synthesis question
//! for a set of people, writing one JSON result per `(person, question)`
//! pair under the outputs directory.

use std::path::PathBuf;
use std::sync::Arc;

use biorag_cli::{base_record, jobs, people, providers, questions};
use biorag_core::status::QuestionStatus;
use biorag_rag::orchestrator::{run_person_pipeline, QuestionJob};
use biorag_store::ResultStore;
use clap::Parser;

/// Answer every configured question for one or more nominees.
#[derive(Debug, Parser)]
#[command(name = "biorag-pipeline")]
struct Args {
    /// Person name(s), spaced or underscore form. Repeatable.
    #[arg(long = "person")]
    person: Vec<String>,

    /// Process every person found under the data directory.
    #[arg(long)]
    all: bool,

    /// Newline-delimited file of person names (`#`-prefixed lines ignored).
    #[arg(long = "people-file")]
    people_file: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(long)]
    verbose: bool,

    /// Override the outputs directory.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug");
    }
    biorag_core::telemetry::init();

    let config = biorag_core::AppConfig::load()?;
    let outputs_dir = args.output.unwrap_or_else(|| config.outputs_dir.clone());

    let selection =
        people::PersonSelection { person: &args.person, all: args.all, people_file: args.people_file.as_deref() };
    let selected = people::resolve_people(selection, &config.data_dir).await?;

    let (manifest, templates) = questions::load_manifest(&config.prompts_dir).await?;

    let database_url = config.require_database_url()?;
    let store = providers::build_chunk_store(database_url).await?;
    let embedder = providers::build_embedder(&config)?;
    let reranker = providers::build_reranker(&config)?;
    let chat = providers::build_chat(&config)?;

    let mut error_count = 0usize;
    for person in &selected {
        let base_record = base_record::load_base_record(&config.data_dir, person).await?;
        let context = base_record.to_question_context();

        let rag_jobs: Vec<Box<dyn QuestionJob>> = manifest
            .rag_questions
            .iter()
            .map(|descriptor| {
                let extraction_template = templates.get(&descriptor.extraction_template).cloned().unwrap_or_default();
                let verification_template = descriptor
                    .verification_template
                    .as_ref()
                    .and_then(|name| templates.get(name).cloned());
                Box::new(jobs::RagQuestionJob {
                    person: person.clone(),
                    descriptor: descriptor.clone(),
                    extraction_template,
                    verification_template,
                    context: context.clone(),
                    base_record: base_record.clone(),
                    store: Arc::clone(&store),
                    embedder: Arc::clone(&embedder),
                    reranker: Arc::clone(&reranker),
                    chat: Arc::clone(&chat),
                    results: ResultStore::new(outputs_dir.clone()),
                }) as Box<dyn QuestionJob>
            })
            .collect();

        let synthesis_jobs: Vec<Box<dyn QuestionJob>> = manifest
            .synthesis_questions
            .iter()
            .map(|descriptor| {
                let extraction_template = templates.get(&descriptor.extraction_template).cloned().unwrap_or_default();
                Box::new(jobs::SynthesisQuestionJob {
                    person: person.clone(),
                    descriptor: descriptor.clone(),
                    extraction_template,
                    context: context.clone(),
                    base_record: base_record.clone(),
                    chat: Arc::clone(&chat),
                    results: ResultStore::new(outputs_dir.clone()),
                }) as Box<dyn QuestionJob>
            })
            .collect();

        let outcomes = run_person_pipeline(rag_jobs, synthesis_jobs).await;
        for outcome in &outcomes {
            if outcome.status == QuestionStatus::Error {
                error_count += 1;
            }
            println!("{}\t{}\t{:?}", person.dir_name(), outcome.question_id, outcome.status);
        }
    }

    tracing::info!(persons = selected.len(), error_count, "pipeline run complete");
    Ok(())
}
