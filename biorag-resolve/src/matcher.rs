//! Multi-tier organization matching cascade.
//!
//! Seven steps, evaluated in order, first terminal outcome wins:
//!
//! 1. classify (keyword + structural cascade)
//! 2. exact canonical-name lookup
//! 3. exact alias/variation lookup
//! 4. fuzzy match (normalize, strip parentheticals, extract acronym, score
//!    with the max of token-sort-ratio and weighted ratio)
//! 5. embedding match (lazy per-subset cosine index)
//! 6. LLM disambiguation over up to five deduplicated candidates
//! 7. review-band proposal, or no match
//!
//! Grounded on `matcher.py`'s `OrgMatcher.match_single` and
//! `fuzzy_match.py`; the short-circuit-on-first-terminal-outcome shape
//! mirrors `wg-bastion::pipeline::executor::PipelineExecutor::run`.

use std::collections::HashMap;

use biorag_providers::{ChatRequest, ChatLlm, EmbeddingInputType, EmbeddingProvider};
use biorag_store::{OntologyEntry, OntologyStore};
use rapidfuzz::fuzz;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::classifier::{classify_org, Category};
use crate::error::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExactCanonical,
    ExactVariation,
    FuzzyCanonical,
    FuzzyVariation,
    Embedding,
    Llm,
}

impl MatchMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMethod::ExactCanonical => "exact_canonical",
            MatchMethod::ExactVariation => "exact_variation",
            MatchMethod::FuzzyCanonical => "fuzzy_canonical",
            MatchMethod::FuzzyVariation => "fuzzy_variation",
            MatchMethod::Embedding => "embedding",
            MatchMethod::Llm => "llm",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub raw_name: String,
    pub matched_canonical: Option<String>,
    pub match_method: Option<MatchMethod>,
    pub match_confidence: Option<f64>,
    pub ontology_tag: Option<String>,
    pub meta_type: String,
    pub matched: bool,
    pub needs_review: bool,
    pub org_type_classified: Category,
    pub proposed_match_canonical: Option<String>,
    pub proposed_match_confidence: Option<f64>,
}

impl MatchResult {
    fn unmatched(raw_name: &str, category: Category) -> Self {
        Self {
            raw_name: raw_name.to_string(),
            matched_canonical: None,
            match_method: None,
            match_confidence: None,
            ontology_tag: None,
            meta_type: category.meta_type().to_string(),
            matched: false,
            needs_review: false,
            org_type_classified: category,
            proposed_match_canonical: None,
            proposed_match_confidence: None,
        }
    }

    fn matched(
        raw_name: &str,
        category: Category,
        entry: &OntologyEntry,
        method: MatchMethod,
        confidence: f64,
    ) -> Self {
        Self {
            raw_name: raw_name.to_string(),
            matched_canonical: Some(entry.canonical_name.clone()),
            match_method: Some(method),
            match_confidence: Some(confidence),
            ontology_tag: entry.canonical_tag.clone(),
            meta_type: entry.meta_type.clone(),
            matched: true,
            needs_review: false,
            org_type_classified: category,
            proposed_match_canonical: None,
            proposed_match_confidence: None,
        }
    }

    fn needs_review(
        raw_name: &str,
        category: Category,
        proposed: &OntologyEntry,
        proposed_confidence: f64,
    ) -> Self {
        Self {
            raw_name: raw_name.to_string(),
            matched_canonical: None,
            match_method: None,
            match_confidence: None,
            ontology_tag: None,
            meta_type: proposed.meta_type.clone(),
            matched: false,
            needs_review: true,
            org_type_classified: category,
            proposed_match_canonical: Some(proposed.canonical_name.clone()),
            proposed_match_confidence: Some(proposed_confidence),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub fuzzy_threshold_accept: f64,
    pub fuzzy_threshold_review: f64,
    pub embedding_threshold: f64,
    pub use_embedding: bool,
    pub use_llm_match: bool,
    pub max_llm_candidates: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold_accept: 88.0,
            fuzzy_threshold_review: 70.0,
            embedding_threshold: 0.82,
            use_embedding: true,
            use_llm_match: true,
            max_llm_candidates: 5,
        }
    }
}

/// Strip parentheticals, collapse whitespace, lowercase, trim trailing
/// punctuation — exactly `fuzzy_match.py::normalize_for_fuzzy`.
pub fn normalize_for_fuzzy(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0u32;
    for ch in name.trim().chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    let collapsed: String = out.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .to_lowercase()
        .trim_end_matches(['.', ',', ';', ':'])
        .trim()
        .to_string()
}

/// Pull a 2-8 char all-caps acronym out of a trailing parenthetical, e.g.
/// `"... Lab (J-PAL)"` → `Some("J-PAL")`.
pub fn extract_acronym(name: &str) -> Option<String> {
    let start = name.rfind('(')?;
    let end = name[start..].find(')')? + start;
    let inner = &name[start + 1..end];
    let len = inner.chars().count();
    if (2..=8).contains(&len)
        && inner
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        && inner.chars().next().is_some_and(|c| c.is_ascii_uppercase())
    {
        Some(inner.to_string())
    } else {
        None
    }
}

fn fuzzy_score(a: &str, b: &str) -> f64 {
    let token_sort = fuzz::token_sort_ratio(a.chars(), b.chars());
    let wratio = fuzz::wratio(a.chars(), b.chars());
    token_sort.max(wratio)
}

struct Candidate<'a> {
    text: String,
    entry: &'a OntologyEntry,
    is_canonical: bool,
}

fn build_candidate_strings(entries: &[&OntologyEntry]) -> Vec<Candidate<'_>> {
    let mut candidates = Vec::new();
    for entry in entries {
        if !entry.canonical_name.is_empty() {
            candidates.push(Candidate {
                text: normalize_for_fuzzy(&entry.canonical_name),
                entry,
                is_canonical: true,
            });
        }
        for variation in &entry.variations_found {
            candidates.push(Candidate {
                text: normalize_for_fuzzy(variation),
                entry,
                is_canonical: false,
            });
        }
    }
    candidates
}

struct FuzzyHit<'a> {
    entry: &'a OntologyEntry,
    score: f64,
    method: MatchMethod,
}

fn fuzzy_match_against_list<'a>(
    raw_name: &str,
    entries: &[&'a OntologyEntry],
    threshold: f64,
) -> Option<FuzzyHit<'a>> {
    if entries.is_empty() {
        return None;
    }

    let normalized_query = normalize_for_fuzzy(raw_name);
    let acronym = extract_acronym(raw_name).map(|a| a.to_lowercase());
    let candidates = build_candidate_strings(entries);
    if candidates.is_empty() {
        return None;
    }

    let mut best_score = 0.0f64;
    let mut best_idx = None;

    for (i, candidate) in candidates.iter().enumerate() {
        let score = fuzzy_score(&normalized_query, &candidate.text);
        if score > best_score {
            best_score = score;
            best_idx = Some(i);
        }
    }

    if let Some(acronym) = acronym {
        for (i, candidate) in candidates.iter().enumerate() {
            let score = fuzzy_score(&acronym, &candidate.text);
            if score > best_score {
                best_score = score;
                best_idx = Some(i);
            }
        }
    }

    let best_idx = best_idx?;
    if best_score < threshold {
        return None;
    }

    let candidate = &candidates[best_idx];
    Some(FuzzyHit {
        entry: candidate.entry,
        score: best_score,
        method: if candidate.is_canonical {
            MatchMethod::FuzzyCanonical
        } else {
            MatchMethod::FuzzyVariation
        },
    })
}

/// Top-N distinct entries scoring above `min_score`, deduplicated by
/// canonical name keeping the best score seen.
fn fuzzy_top_n<'a>(
    raw_name: &str,
    entries: &[&'a OntologyEntry],
    n: usize,
    min_score: f64,
) -> Vec<(&'a OntologyEntry, f64)> {
    let normalized_query = normalize_for_fuzzy(raw_name);
    let acronym = extract_acronym(raw_name).map(|a| a.to_lowercase());
    let candidates = build_candidate_strings(entries);

    let mut best_by_name: HashMap<String, (&OntologyEntry, f64)> = HashMap::new();
    for candidate in &candidates {
        let mut score = fuzzy_score(&normalized_query, &candidate.text);
        if let Some(ref acronym) = acronym {
            score = score.max(fuzzy_score(acronym, &candidate.text));
        }
        let key = candidate.entry.canonical_name.clone();
        best_by_name
            .entry(key)
            .and_modify(|(_, best)| {
                if score > *best {
                    *best = score;
                }
            })
            .or_insert((candidate.entry, score));
    }

    let mut results: Vec<(&OntologyEntry, f64)> = best_by_name
        .into_values()
        .filter(|(_, score)| *score >= min_score)
        .collect();
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(n);
    results
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

/// Lazily-built, per-subset cosine index over ontology entries' canonical
/// names. Rebuilt whenever the requested subset key changes.
struct EmbedIndex {
    key: String,
    vectors: Vec<(String, Vec<f32>)>,
}

/// Multi-tier organization matcher. Construct once per batch run and reuse
/// across every raw organization name — rebuilding the ontology indexes or
/// the embedding index per call would be wasteful.
pub struct OrgMatcher<'a> {
    config: MatchConfig,
    ontology: &'a OntologyStore,
    embedder: Option<&'a dyn EmbeddingProvider>,
    chat: Option<&'a dyn ChatLlm>,
    embed_index: Mutex<Option<EmbedIndex>>,
}

impl<'a> OrgMatcher<'a> {
    pub fn new(
        config: MatchConfig,
        ontology: &'a OntologyStore,
        embedder: Option<&'a dyn EmbeddingProvider>,
        chat: Option<&'a dyn ChatLlm>,
    ) -> Self {
        Self {
            config,
            ontology,
            embedder,
            chat,
            embed_index: Mutex::new(None),
        }
    }

    fn entries_for(&self, search_meta_type: Option<&str>) -> Vec<&'a OntologyEntry> {
        match search_meta_type {
            Some(meta_type) => self.ontology.get_by_meta_type(meta_type),
            None => self.ontology.get_all().iter().collect(),
        }
    }

    async fn ensure_embed_index(&self, search_meta_type: Option<&str>) -> Result<(), ResolveError> {
        let Some(embedder) = self.embedder else {
            return Ok(());
        };
        let key = search_meta_type.unwrap_or("all").to_string();

        let mut guard = self.embed_index.lock().await;
        if guard.as_ref().is_some_and(|idx| idx.key == key) {
            return Ok(());
        }

        let entries = self.entries_for(search_meta_type);
        let names: Vec<String> = entries.iter().map(|e| e.canonical_name.clone()).collect();
        if names.is_empty() {
            *guard = Some(EmbedIndex { key, vectors: Vec::new() });
            return Ok(());
        }

        let vectors = embedder.embed(&names, EmbeddingInputType::SearchDocument).await?;
        let indexed = names.into_iter().zip(vectors).collect();
        *guard = Some(EmbedIndex { key, vectors: indexed });
        Ok(())
    }

    async fn embed_find_similar(
        &self,
        raw_name: &str,
        search_meta_type: Option<&str>,
    ) -> Result<Option<(&'a OntologyEntry, f64)>, ResolveError> {
        let Some(embedder) = self.embedder else {
            return Ok(None);
        };
        self.ensure_embed_index(search_meta_type).await?;

        let query_vec = embedder
            .embed(&[raw_name.to_string()], EmbeddingInputType::SearchQuery)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let guard = self.embed_index.lock().await;
        let Some(index) = guard.as_ref() else {
            return Ok(None);
        };

        let mut best: Option<(&str, f64)> = None;
        for (name, vector) in &index.vectors {
            let score = cosine_similarity(&query_vec, vector);
            if best.as_ref().is_none_or(|(_, b)| score > *b) {
                best = Some((name.as_str(), score));
            }
        }

        let (name, score) = match best {
            Some(pair) if pair.1 >= self.config.embedding_threshold => pair,
            _ => return Ok(None),
        };

        Ok(self
            .ontology
            .lookup_canonical(name)
            .map(|entry| (entry, score)))
    }

    /// Run the full cascade for one raw organization name. `context` is an
    /// optional free-form hint (e.g. `"Person: Amina Mohammed"`) passed to
    /// the LLM disambiguation step.
    pub async fn match_single(
        &self,
        raw_name: &str,
        context: Option<&str>,
    ) -> Result<MatchResult, ResolveError> {
        let raw_name = raw_name.trim();
        if raw_name.is_empty() {
            return Ok(MatchResult::unmatched("", Category::Other));
        }

        let category = classify_org(raw_name);
        let search_meta_type = category.search_meta_type();

        if let Some(entry) = self.ontology.lookup_canonical(raw_name) {
            return Ok(MatchResult::matched(
                raw_name,
                category,
                entry,
                MatchMethod::ExactCanonical,
                1.0,
            ));
        }
        if let Some(entry) = self.ontology.lookup_variation(raw_name) {
            return Ok(MatchResult::matched(
                raw_name,
                category,
                entry,
                MatchMethod::ExactVariation,
                1.0,
            ));
        }

        let entries = self.entries_for(search_meta_type);
        let fuzzy_hit = fuzzy_match_against_list(raw_name, &entries, self.config.fuzzy_threshold_review);

        let mut review_candidate: Option<(&OntologyEntry, f64)> = None;
        if let Some(hit) = fuzzy_hit {
            if hit.score >= self.config.fuzzy_threshold_accept {
                return Ok(MatchResult::matched(
                    raw_name,
                    category,
                    hit.entry,
                    hit.method,
                    hit.score / 100.0,
                ));
            }
            review_candidate = Some((hit.entry, hit.score));
        }

        if self.config.use_embedding {
            if let Some((entry, score)) = self.embed_find_similar(raw_name, search_meta_type).await? {
                return Ok(MatchResult::matched(
                    raw_name,
                    category,
                    entry,
                    MatchMethod::Embedding,
                    score,
                ));
            }
        }

        if self.config.use_llm_match {
            if let Some(chat) = self.chat {
                let mut top: Vec<(&OntologyEntry, f64)> =
                    fuzzy_top_n(raw_name, &entries, self.config.max_llm_candidates, 40.0);

                if top.len() < self.config.max_llm_candidates {
                    let seen: std::collections::HashSet<&str> =
                        top.iter().map(|(e, _)| e.canonical_name.as_str()).collect();
                    for entry in &entries {
                        if top.len() >= self.config.max_llm_candidates {
                            break;
                        }
                        if !seen.contains(entry.canonical_name.as_str()) {
                            top.push((entry, 0.0));
                        }
                    }
                }

                if !top.is_empty() {
                    if let Some((entry, confidence)) =
                        self.llm_disambiguate(chat, raw_name, &top, context).await?
                    {
                        return Ok(MatchResult::matched(
                            raw_name,
                            category,
                            entry,
                            MatchMethod::Llm,
                            confidence,
                        ));
                    }
                }
            }
        }

        if let Some((entry, score)) = review_candidate {
            return Ok(MatchResult::needs_review(raw_name, category, entry, score / 100.0));
        }

        Ok(MatchResult::unmatched(raw_name, category))
    }

    /// Ask the LLM to pick one of `candidates` as the correct match for
    /// `raw_name`, or decline. Accepts only an in-range index with
    /// confidence ≥ 0.4, mirroring `llm_match.py::llm_disambiguate`.
    async fn llm_disambiguate(
        &self,
        chat: &dyn ChatLlm,
        raw_name: &str,
        candidates: &[(&'a OntologyEntry, f64)],
        context: Option<&str>,
    ) -> Result<Option<(&'a OntologyEntry, f64)>, ResolveError> {
        let listing = candidates
            .iter()
            .enumerate()
            .map(|(i, (entry, _))| format!("{i}. {}", entry.canonical_name))
            .collect::<Vec<_>>()
            .join("\n");

        let context_line = context.map(|c| format!("\nContext: {c}")).unwrap_or_default();
        let prompt = format!(
            "Organization name: \"{raw_name}\"{context_line}\n\nCandidates:\n{listing}\n\n\
             Which candidate (if any) refers to the same organization? Respond with JSON \
             {{\"index\": <int or null>, \"confidence\": <0.0-1.0>}}."
        );

        let response = chat.complete(ChatRequest::new(prompt).with_temperature(0.0)).await?;
        let Some(parsed) = response.parsed else {
            return Ok(None);
        };

        let index = parsed.get("index").and_then(|v| v.as_i64());
        let confidence = parsed.get("confidence").and_then(|v| v.as_f64()).unwrap_or(0.0);

        let Some(index) = index else { return Ok(None) };
        if index < 0 || index as usize >= candidates.len() || confidence < 0.4 {
            return Ok(None);
        }

        Ok(Some((candidates[index as usize].0, confidence)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_parentheticals_and_punctuation() {
        assert_eq!(
            normalize_for_fuzzy("University  of   Oxford (UK)."),
            "university of oxford"
        );
    }

    #[test]
    fn extract_acronym_accepts_caps_in_parens() {
        assert_eq!(
            extract_acronym("Abdul Latif Jameel Poverty Action Lab (J-PAL)"),
            Some("J-PAL".to_string())
        );
    }

    #[test]
    fn extract_acronym_rejects_non_caps() {
        assert_eq!(extract_acronym("University of Calcutta"), None);
    }

    #[test]
    fn fuzzy_score_identical_strings_is_100() {
        assert_eq!(fuzzy_score("oxford university", "oxford university"), 100.0);
    }
}
