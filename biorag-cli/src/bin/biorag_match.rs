//! Matching orchestrator binary: walks each selected person's career
//! timeline, runs the Matcher Cascade on every organization mention,
//! writes an org-links sidecar, and stubs unmatched organizations into
//! the ontology for later enrichment.

use std::path::PathBuf;

use biorag_cli::{career, people, providers};
use biorag_core::PersonName;
use biorag_resolve::{MatchConfig, MatchResult, OrgMatcher};
use biorag_store::{OntologyEntry, OntologyStore};
use clap::Parser;
use futures_util::stream::{self, StreamExt};

#[derive(Debug, Parser)]
#[command(name = "biorag-match")]
struct Args {
    #[arg(long, conflicts_with = "person")]
    all: bool,

    #[arg(long = "person", conflicts_with = "all")]
    person: Vec<String>,

    /// Print a summary only; write nothing.
    #[arg(long = "dry-run")]
    dry_run: bool,

    #[arg(long, default_value_t = 4)]
    workers: usize,

    #[arg(long = "no-embed")]
    no_embed: bool,

    #[arg(long = "no-llm")]
    no_llm: bool,

    /// Overrides the fuzzy-accept threshold (0-100).
    #[arg(long)]
    threshold: Option<f64>,

    #[arg(long)]
    verbose: bool,
}

struct PersonMatches {
    person: PersonName,
    results: Vec<MatchResult>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.verbose && std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "debug");
    }
    biorag_core::telemetry::init();

    let config = biorag_core::AppConfig::load()?;

    let selection = people::PersonSelection { person: &args.person, all: args.all, people_file: None };
    let selected = people::resolve_people(selection, &config.data_dir).await?;

    let mut ontology = OntologyStore::load(&config.ontology_path).await?;

    let embedder = if args.no_embed { None } else { Some(providers::build_embedder(&config)?) };
    let chat = if args.no_llm { None } else { Some(providers::build_chat(&config)?) };

    let mut match_config = MatchConfig {
        use_embedding: !args.no_embed,
        use_llm_match: !args.no_llm,
        ..MatchConfig::default()
    };
    if let Some(threshold) = args.threshold {
        match_config.fuzzy_threshold_accept = threshold;
    }

    let matcher = OrgMatcher::new(match_config, &ontology, embedder.as_deref(), chat.as_deref());

    let mut person_events: Vec<(PersonName, Vec<career::CareerEvent>)> = Vec::new();
    for person in &selected {
        let events = career::load_career_events(&config.data_dir, person).await?;
        if !events.is_empty() {
            person_events.push((person.clone(), events));
        }
    }

    // Bounded fan-out over every (person, career event) pair, driven in this
    // task rather than spawned — the matcher borrows the ontology store, so
    // it can't cross a `'static`-bound task boundary.
    let jobs: Vec<(usize, &career::CareerEvent)> = person_events
        .iter()
        .enumerate()
        .flat_map(|(idx, (_, events))| events.iter().map(move |event| (idx, event)))
        .collect();

    let matcher = &matcher;
    let person_events_ref = &person_events;
    let outcomes: Vec<(usize, Result<MatchResult, biorag_resolve::ResolveError>)> = stream::iter(jobs)
        .map(|(idx, event)| async move {
            let person = &person_events_ref[idx].0;
            let context = format!("Person: {}", person.db_name());
            let result = matcher.match_single(&event.organization, Some(&context)).await;
            (idx, result)
        })
        .buffer_unordered(args.workers.max(1))
        .collect()
        .await;

    let mut buckets: Vec<Vec<MatchResult>> = vec![Vec::new(); person_events.len()];
    for (idx, result) in outcomes {
        buckets[idx].push(result?);
    }
    let mut per_person: Vec<PersonMatches> = person_events
        .into_iter()
        .zip(buckets)
        .map(|((person, _events), results)| PersonMatches { person, results })
        .collect();
    per_person.sort_by(|a, b| a.person.dir_name().cmp(b.person.dir_name()));

    let mut matched = 0usize;
    let mut needs_review = 0usize;
    let mut stubs_created = 0usize;
    let mut new_stubs: Vec<OntologyEntry> = Vec::new();

    for person_matches in &per_person {
        for result in &person_matches.results {
            if result.matched {
                matched += 1;
            } else if result.needs_review {
                needs_review += 1;
            } else if ontology.lookup_canonical(&result.raw_name).is_none() {
                stubs_created += 1;
                new_stubs.push(OntologyEntry {
                    canonical_name: result.raw_name.clone(),
                    meta_type: result.meta_type.clone(),
                    variations_found: Vec::new(),
                    sector: result.org_type_classified.sector().to_string(),
                    country: None,
                    city: None,
                    org_types: result
                        .org_type_classified
                        .org_types()
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    hierarchical_tags: Vec::new(),
                    canonical_tag: None,
                    parent: None,
                    source: "auto_stub".to_string(),
                    status: "pending_review".to_string(),
                });
            }
        }
    }

    println!("persons processed: {}", per_person.len());
    println!("matched: {matched}  needs_review: {needs_review}  new_stubs: {stubs_created}");

    if args.dry_run {
        println!("(dry run, no files written)");
        return Ok(());
    }

    for person_matches in &per_person {
        let path: PathBuf = career::org_links_path(&config.data_dir, &person_matches.person);
        biorag_store::atomic::write_json_atomic(&path, &person_matches.results).await?;
    }

    if !new_stubs.is_empty() {
        ontology.add_entries(new_stubs);
        ontology.save().await?;
    }

    Ok(())
}
