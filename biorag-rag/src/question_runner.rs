//! Question Runner: the extraction and verification passes that turn a
//! ranked chunk list into a person-level answer.
//!
//! Grounded on `runner.py::run_extraction_pass`, `run_verification_pass`,
//! `build_candidate_strings`, and `determine_status`. Template loading and
//! filesystem concerns live in `biorag-cli`; this module takes already
//! resolved prompt templates and chunk lists and owns only the pass logic.

use std::collections::HashSet;

use biorag_core::status::QuestionStatus;
use biorag_providers::{ChatLlm, ChatRequest};
use serde_json::Value;

use crate::ranker::RankedChunk;

/// Placeholders substituted into extraction/verification templates.
/// Unknown `{{PLACEHOLDER}}` tokens are left untouched, matching
/// `fill_template`'s behavior in the original.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

/// Per-person, per-question context threaded into every prompt.
#[derive(Debug, Clone, Default)]
pub struct QuestionContext {
    pub person_name: String,
    pub hlp_name: String,
    pub nomination_year: String,
    pub nomination_age: String,
}

/// How the extraction pass picks a winner across scanned chunks.
#[derive(Debug, Clone)]
pub enum BestAnswerPolicy {
    /// Keep the first chunk whose parse isn't `cannot_determine`.
    FirstFact,
    /// Keep whichever chunk's parse has the longest array at
    /// `primary_list_field`, ties keeping the earliest.
    RichestList { primary_list_field: String },
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub policy: BestAnswerPolicy,
    pub max_chunks_to_scan: usize,
    pub high_confidence_early_stop: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            policy: BestAnswerPolicy::FirstFact,
            max_chunks_to_scan: 10,
            high_confidence_early_stop: true,
        }
    }
}

/// One chunk's extraction attempt, kept whether or not it became the
/// best answer, so the full scan is auditable.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExtractionTraceEntry {
    pub chunk_id: i64,
    pub chunk_index: i32,
    pub source_id: i64,
    pub url: String,
    pub domain: String,
    pub similarity: f64,
    pub rerank_score: Option<f32>,
    pub raw_llm_output: String,
    pub parsed: Option<Value>,
    pub confidence: Option<String>,
    pub cannot_determine: bool,
    pub early_stop_triggered: bool,
    pub error: Option<String>,
}

/// Outcome of [`run_extraction_pass`].
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub best: Option<Value>,
    pub trace: Vec<ExtractionTraceEntry>,
    pub chunks_scanned: usize,
    pub early_stop_triggered: bool,
}

fn is_cannot_determine(parsed: &Option<Value>) -> bool {
    match parsed {
        None => true,
        Some(value) => value
            .get("cannot_determine")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

fn confidence_of(parsed: &Option<Value>) -> Option<String> {
    parsed
        .as_ref()
        .and_then(|v| v.get("confidence"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn list_richness(parsed: &Value, field: &str) -> usize {
    parsed.get(field).and_then(Value::as_array).map_or(0, Vec::len)
}

/// Scan up to `max_chunks_to_scan` reranked chunks, extracting a
/// candidate answer from each, and keep the best by the configured
/// policy. Stops early once a high-confidence answer is found, if
/// `high_confidence_early_stop` is set.
pub async fn run_extraction_pass(
    chat: &dyn ChatLlm,
    chunks: &[RankedChunk],
    template: &str,
    context: &QuestionContext,
    config: &ExtractionConfig,
) -> ExtractionOutcome {
    let mut best: Option<Value> = None;
    let mut best_richness = 0usize;
    let mut trace = Vec::new();
    let mut early_stop_triggered = false;

    for ranked in chunks.iter().take(config.max_chunks_to_scan) {
        let prompt = fill_template(
            template,
            &[
                ("PERSON_NAME", &context.person_name),
                ("HLP_NAME", &context.hlp_name),
                ("NOMINATION_YEAR", &context.nomination_year),
                ("NOMINATION_AGE", &context.nomination_age),
                ("CHUNK_TEXT", &ranked.chunk.text),
            ],
        );

        let (raw_text, parsed, error) = match chat.complete(ChatRequest::new(prompt)).await {
            Ok(response) => (response.raw_text, response.parsed, None),
            Err(err) => (format!("ERROR: {err}"), None, Some(err.to_string())),
        };

        let cannot_determine = is_cannot_determine(&parsed);
        let confidence = confidence_of(&parsed);

        if !cannot_determine {
            if let Some(value) = &parsed {
                let becomes_best = match &config.policy {
                    BestAnswerPolicy::FirstFact => best.is_none(),
                    BestAnswerPolicy::RichestList { primary_list_field } => {
                        let richness = list_richness(value, primary_list_field);
                        richness > best_richness || (best.is_none() && richness == 0)
                    }
                };
                if becomes_best {
                    if let BestAnswerPolicy::RichestList { primary_list_field } = &config.policy {
                        best_richness = list_richness(value, primary_list_field);
                    }
                    best = Some(value.clone());
                }
            }
        }

        let stop_now = config.high_confidence_early_stop
            && best.is_some()
            && confidence.as_deref() == Some("high");
        if stop_now {
            early_stop_triggered = true;
        }

        trace.push(ExtractionTraceEntry {
            chunk_id: ranked.chunk.chunk_id,
            chunk_index: ranked.chunk.chunk_index,
            source_id: ranked.chunk.source_id,
            url: ranked.chunk.url.clone(),
            domain: ranked.domain.clone(),
            similarity: ranked.similarity,
            rerank_score: ranked.rerank_score,
            raw_llm_output: raw_text,
            parsed,
            confidence,
            cannot_determine,
            early_stop_triggered: stop_now,
            error,
        });

        if stop_now {
            break;
        }
    }

    let chunks_scanned = trace.len();
    ExtractionOutcome {
        best,
        trace,
        chunks_scanned,
        early_stop_triggered,
    }
}

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub max_verification_chunks: usize,
    pub exclude_primary_domain: bool,
    pub candidate_title_field: String,
    pub candidate_org_field: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_verification_chunks: 5,
            exclude_primary_domain: true,
            candidate_title_field: "job_title_at_nomination".to_string(),
            candidate_org_field: "organization_at_nomination".to_string(),
        }
    }
}

/// Renders a `Value` field into a short candidate string for the
/// verification prompt: a plain string passes through; an array of
/// objects is rendered as up to three `label (sub, org, period)` entries.
fn render_candidate_field(parsed: &Value, field: &str) -> String {
    match parsed.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .take(3)
            .map(render_candidate_item)
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn render_candidate_item(item: &Value) -> String {
    if let Some(s) = item.as_str() {
        return s.to_string();
    }
    let label = item
        .get("label")
        .or_else(|| item.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let sub = item.get("sub").and_then(Value::as_str);
    let org = item.get("org").and_then(Value::as_str);
    let period = item.get("period").and_then(Value::as_str);
    let mut parts = vec![label.to_string()];
    for extra in [sub, org, period].into_iter().flatten() {
        parts.push(extra.to_string());
    }
    parts.join(", ")
}

/// Builds the `CANDIDATE_JOB_TITLE`/`CANDIDATE_ORGANIZATION` strings fed
/// into the verification template.
pub fn build_candidate_strings(best: &Value, config: &VerificationConfig) -> (String, String) {
    (
        render_candidate_field(best, &config.candidate_title_field),
        render_candidate_field(best, &config.candidate_org_field),
    )
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct VerificationTraceEntry {
    pub chunk_id: i64,
    pub url: String,
    pub raw_llm_output: String,
    pub confirms: Option<bool>,
    pub error: Option<String>,
}

/// Outcome of [`run_verification_pass`].
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub confirmation_count: usize,
    pub trace: Vec<VerificationTraceEntry>,
}

/// Verify `best` against up to `max_verification_chunks` chunks that
/// weren't already used for extraction (and, if configured, aren't from
/// the chunk that produced the answer's own domain).
#[allow(clippy::too_many_arguments)]
pub async fn run_verification_pass(
    chat: &dyn ChatLlm,
    chunks: &[RankedChunk],
    template: &str,
    context: &QuestionContext,
    best: &Value,
    used_chunk_ids: &HashSet<i64>,
    primary_domain: Option<&str>,
    config: &VerificationConfig,
) -> VerificationOutcome {
    let (candidate_title, candidate_org) = build_candidate_strings(best, config);

    let candidates: Vec<&RankedChunk> = chunks
        .iter()
        .filter(|c| !used_chunk_ids.contains(&c.chunk.chunk_id))
        .filter(|c| {
            !config.exclude_primary_domain
                || primary_domain.is_none_or(|domain| c.domain != domain)
        })
        .take(config.max_verification_chunks)
        .collect();

    let mut confirmation_count = 0usize;
    let mut trace = Vec::with_capacity(candidates.len());

    for ranked in candidates {
        let prompt = fill_template(
            template,
            &[
                ("PERSON_NAME", &context.person_name),
                ("HLP_NAME", &context.hlp_name),
                ("CANDIDATE_JOB_TITLE", &candidate_title),
                ("CANDIDATE_ORGANIZATION", &candidate_org),
                ("CHUNK_TEXT", &ranked.chunk.text),
            ],
        );

        let request = ChatRequest::new(prompt).with_temperature(0.1).with_max_tokens(800);
        let (raw_text, confirms, error) = match chat.complete(request).await {
            Ok(response) => {
                let confirms = response
                    .parsed
                    .as_ref()
                    .and_then(|v| v.get("confirms"))
                    .and_then(Value::as_bool);
                (response.raw_text, confirms, None)
            }
            Err(err) => (format!("ERROR: {err}"), None, Some(err.to_string())),
        };

        if confirms == Some(true) {
            confirmation_count += 1;
        }

        trace.push(VerificationTraceEntry {
            chunk_id: ranked.chunk.chunk_id,
            url: ranked.chunk.url.clone(),
            raw_llm_output: raw_text,
            confirms,
            error,
        });
    }

    VerificationOutcome {
        confirmation_count,
        trace,
    }
}

/// Thin wrapper over [`biorag_core::status::QuestionStatus::determine`]
/// taking the question-runner's own result shapes directly.
pub fn determine_status(
    error: bool,
    skipped: bool,
    chunks_retrieved: usize,
    best: &Option<Value>,
    confirmation_count: usize,
) -> QuestionStatus {
    QuestionStatus::determine(error, skipped, chunks_retrieved, best.is_some(), confirmation_count)
}
