//! The enrichment worker pool: fan out ontology stubs across a fixed
//! number of tasks, each doing search → LLM extraction → proposal, with
//! periodic checkpointing and a ctrl-c graceful stop.
//!
//! Grounded on `batch_enrich_full.py`'s `ThreadPoolExecutor`-based driver
//! (`_enrich_one`, the checkpoint-every-N flush, and the
//! `KeyboardInterrupt` handler that stops submitting new work and saves
//! what's done) and on [`crate::cache::ProposalCache`]'s lock discipline.

use std::sync::Arc;

use biorag_providers::{ChatLlm, ChatRequest, SearchProvider};
use biorag_store::OntologyEntry;
use tokio::sync::{Mutex, Semaphore};

use crate::cache::ProposalCache;
use crate::context::{build_context, build_extraction_prompt};
use crate::proposal::{EnrichmentMethod, EnrichmentProposal};
use crate::run_file::RunFile;

/// Everything one worker needs to enrich a single stub. Cheap to clone —
/// every field is an `Arc` or a plain value.
#[derive(Clone)]
pub struct EnrichmentProviders {
    pub search: Arc<dyn SearchProvider>,
    pub chat: Arc<dyn ChatLlm>,
}

/// Settings that change the shape of a run without changing providers.
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub workers: usize,
    pub no_llm: bool,
    pub checkpoint_every: usize,
    /// Delay before each new stub is dispatched, throttling the rate new
    /// work enters the pool. Zero disables throttling.
    pub delay: std::time::Duration,
    /// Bypass the search cache for every stub, refetching even names
    /// already cached from a prior run.
    pub force_search: bool,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            no_llm: false,
            checkpoint_every: 25,
            delay: std::time::Duration::ZERO,
            force_search: false,
        }
    }
}

/// Enrich one stub: search for evidence, then (unless `no_llm`) ask the
/// chat model to extract structured fields from it. Every failure path —
/// search error, LLM error, unparseable response — degrades to
/// [`EnrichmentProposal::fallback`] rather than aborting the batch.
#[tracing::instrument(skip(providers, cache, stub), fields(canonical_name = %stub.canonical_name))]
pub async fn enrich_stub(
    stub: &OntologyEntry,
    providers: &EnrichmentProviders,
    cache: &ProposalCache,
    no_llm: bool,
    force_search: bool,
) -> EnrichmentProposal {
    let cached = if force_search { None } else { cache.get(&stub.canonical_name).await };
    let response = match cached {
        Some(cached) => cached,
        None => match providers.search.search(&stub.canonical_name).await {
            Ok(response) => {
                cache.put(&stub.canonical_name, response.clone()).await;
                response
            }
            Err(error) => {
                return EnrichmentProposal::fallback(stub, format!("search failed: {error}"));
            }
        },
    };

    if no_llm {
        let sources = response.source_domains();
        return EnrichmentProposal {
            canonical_name: stub.canonical_name.clone(),
            variations_found: stub.variations_found.clone(),
            meta_type: stub.meta_type.clone(),
            sector: String::new(),
            location_country: None,
            location_city: None,
            suggested_tag: String::new(),
            confidence: if sources.is_empty() { 0.0 } else { 0.2 },
            sources,
            reasoning: "search evidence only, no LLM extraction requested".to_string(),
            enrichment_method: EnrichmentMethod::SerperOnly,
        };
    }

    let context = build_context(&response);
    if context.is_empty() {
        return EnrichmentProposal::fallback(stub, "no search evidence found");
    }

    let prompt = build_extraction_prompt(&stub.canonical_name, &context);
    let chat_response = match providers.chat.complete(ChatRequest::new(prompt)).await {
        Ok(chat_response) => chat_response,
        Err(error) => {
            return EnrichmentProposal::fallback(stub, format!("LLM extraction failed: {error}"));
        }
    };

    let Some(parsed) = chat_response.parsed else {
        return EnrichmentProposal::fallback(stub, "LLM response was not valid JSON");
    };

    match serde_json::from_value::<EnrichmentProposal>(parsed) {
        Ok(mut proposal) => {
            proposal.enrichment_method = EnrichmentMethod::SerperLlm;
            proposal
        }
        Err(error) => EnrichmentProposal::fallback(stub, format!("LLM response missing fields: {error}")),
    }
}

/// Outcome of a batch run: whether it finished every stub or was stopped
/// early by ctrl-c.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed,
    Interrupted,
}

/// Enrich every stub in `stubs`, writing proposals into `run_file.results`
/// and checkpointing to disk every `settings.checkpoint_every` completions.
/// A ctrl-c during the run stops new stubs from starting; already-running
/// workers finish and are folded into the final checkpoint.
pub async fn enrich_batch(
    stubs: Vec<OntologyEntry>,
    providers: EnrichmentProviders,
    cache: ProposalCache,
    run_file: &mut RunFile,
    settings: &EnrichmentSettings,
) -> Result<BatchOutcome, crate::error::EnrichError> {
    let already_done: std::collections::HashSet<String> =
        run_file.results.keys().cloned().collect();
    let pending: Vec<OntologyEntry> = stubs
        .into_iter()
        .filter(|s| !already_done.contains(&s.canonical_name))
        .collect();

    let semaphore = Arc::new(Semaphore::new(settings.workers.max(1)));
    let completed_since_checkpoint = Arc::new(Mutex::new(0usize));
    let mut set = tokio::task::JoinSet::new();
    let mut stubs_iter = pending.into_iter();
    let no_llm = settings.no_llm;
    let force_search = settings.force_search;

    let mut interrupted = false;
    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());

    loop {
        // Keep the pool full while there's pending work and we haven't
        // been asked to stop.
        while set.len() < settings.workers.max(1) {
            let Some(stub) = stubs_iter.next() else { break };
            if !settings.delay.is_zero() {
                tokio::time::sleep(settings.delay).await;
            }
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
            let providers = providers.clone();
            let cache = cache.clone();
            set.spawn(async move {
                let _permit = permit;
                let proposal = enrich_stub(&stub, &providers, &cache, no_llm, force_search).await;
                (stub.canonical_name, proposal)
            });
        }

        if set.is_empty() {
            break;
        }

        tokio::select! {
            outcome = set.join_next() => {
                match outcome {
                    Some(Ok((name, proposal))) => {
                        run_file.results.insert(name, proposal);
                        run_file.processed += 1;
                        let mut count = completed_since_checkpoint.lock().await;
                        *count += 1;
                        if *count >= settings.checkpoint_every {
                            *count = 0;
                            drop(count);
                            run_file.save().await?;
                        }
                    }
                    Some(Err(join_error)) => {
                        tracing::error!(%join_error, "enrichment worker task panicked");
                    }
                    None => break,
                }
            }
            _ = &mut ctrl_c, if !interrupted => {
                tracing::warn!("interrupted: saving progress and exiting");
                interrupted = true;
                stubs_iter = Vec::new().into_iter();
            }
        }
    }

    if interrupted {
        run_file.save().await?;
        Ok(BatchOutcome::Interrupted)
    } else {
        run_file.mark_complete();
        run_file.save().await?;
        Ok(BatchOutcome::Completed)
    }
}
