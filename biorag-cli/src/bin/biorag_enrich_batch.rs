//! Enrichment batch binary: fills in sector, location, and hierarchical
//! tags for pending ontology stubs, checkpointing to a resumable run file.

use std::path::PathBuf;
use std::time::Duration;

use biorag_cli::providers;
use biorag_enrich::{
    enrich_batch, find_latest_resumable, new_output_path, EnrichmentProviders, EnrichmentSettings,
    ProposalCache, RunArgs, RunFile,
};
use biorag_store::OntologyStore;
use clap::Parser;

/// Enrich ontology stubs awaiting sector, location, and tag data.
#[derive(Debug, Parser)]
#[command(name = "biorag-enrich-batch")]
struct Args {
    /// Restrict to stubs with this meta-type. Repeatable; empty means all.
    #[arg(long = "meta-type")]
    meta_type: Vec<String>,

    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Seconds to wait before dispatching each new stub.
    #[arg(long, default_value_t = 0.0)]
    delay: f64,

    /// Start a new run even if a resumable one exists.
    #[arg(long)]
    fresh: bool,

    /// Resume a specific checkpoint file instead of auto-detecting one.
    #[arg(long)]
    resume: Option<PathBuf>,

    #[arg(long = "no-llm")]
    no_llm: bool,

    #[arg(long, default_value_t = 25)]
    checkpoint: usize,

    /// Cap the number of stubs processed this run.
    #[arg(long)]
    limit: Option<usize>,

    /// Bypass the search cache, refetching every stub.
    #[arg(long = "force-search")]
    force_search: bool,

    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug");
    }
    biorag_core::telemetry::init();

    let config = biorag_core::AppConfig::load()?;

    let ontology = OntologyStore::load(&config.ontology_path).await?;
    let pending = ontology.get_pending_stubs();
    let mut stubs: Vec<_> = if args.meta_type.is_empty() {
        pending.into_iter().cloned().collect()
    } else {
        pending
            .into_iter()
            .filter(|entry| args.meta_type.iter().any(|mt| mt.eq_ignore_ascii_case(&entry.meta_type)))
            .cloned()
            .collect()
    };
    if let Some(limit) = args.limit {
        stubs.truncate(limit);
    }
    let original_meta_types: Vec<(String, String)> =
        stubs.iter().map(|s| (s.canonical_name.clone(), s.meta_type.clone())).collect();

    let base_dir = config
        .outputs_dir
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let resume_path = if args.fresh {
        None
    } else if let Some(path) = &args.resume {
        Some(path.clone())
    } else {
        find_latest_resumable(&base_dir).await
    };

    let run_args = RunArgs {
        meta_types: args.meta_type.clone(),
        workers: args.workers,
        no_llm: args.no_llm,
        limit: args.limit,
    };

    let mut run_file = match resume_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "resuming enrichment run");
            RunFile::load(&path).await?
        }
        None => {
            let output_path = new_output_path(&base_dir, chrono::Utc::now());
            let run_id = format!("run-{}", chrono::Utc::now().format("%Y%m%d%H%M%S"));
            RunFile::new(output_path, run_id, run_args, stubs.len())
        }
    };

    let cache_path = config.data_dir.join("enrichment_cache.json");
    let cache = ProposalCache::load(&cache_path).await;

    let search = providers::build_search(&config)?;
    let chat = providers::build_chat(&config)?;
    let enrichment_providers = EnrichmentProviders { search, chat };

    let settings = EnrichmentSettings {
        workers: args.workers,
        no_llm: args.no_llm,
        checkpoint_every: args.checkpoint,
        delay: Duration::from_secs_f64(args.delay.max(0.0)),
        force_search: args.force_search,
    };

    let outcome = enrich_batch(stubs, enrichment_providers, cache, &mut run_file, &settings).await?;
    tracing::info!(?outcome, output_path = %run_file.output_path.display(), "enrichment batch finished");

    let summary = biorag_enrich::summarize(&run_file, &original_meta_types);
    println!("{}", biorag_enrich::format_summary(&summary));
    println!("checkpoint: {}", run_file.output_path.display());

    Ok(())
}
