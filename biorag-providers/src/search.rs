//! Web search provider trait and a Serper.dev-backed implementation, used
//! by the Enrichment Engine to gather evidence before the LLM field
//! proposal call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Serper's knowledge-graph block, when the query resolves to a known
/// entity. Most reliable single source for well-known organizations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub title: String,
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website: String,
}

/// Serper's answer box, when present — often a more concise summary than
/// any single organic snippet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerBox {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    /// Host the result came from, `www.`-stripped, e.g. `"mit.edu"`.
    pub domain: String,
}

/// A full structured search response: knowledge graph, answer box, and
/// organic snippets, mirroring what Serper returns for an organization
/// lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub knowledge_graph: Option<KnowledgeGraph>,
    pub answer_box: Option<AnswerBox>,
    pub results: Vec<SearchResult>,
}

impl SearchResponse {
    /// Every distinct source domain that contributed a result.
    pub fn source_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = Vec::new();
        for result in &self.results {
            if !result.domain.is_empty() && !domains.contains(&result.domain) {
                domains.push(result.domain.clone());
            }
        }
        domains
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse, SearchError>;
}

/// Serper.dev Google Search proxy.
pub struct SerperSearch {
    client: reqwest::Client,
    api_key: String,
}

impl SerperSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: u32,
    gl: &'a str,
    hl: &'a str,
}

#[derive(Deserialize, Default)]
struct SerperResponseBody {
    #[serde(default)]
    organic: Vec<SerperOrganicResult>,
    #[serde(rename = "knowledgeGraph")]
    knowledge_graph: Option<SerperKnowledgeGraph>,
    #[serde(rename = "answerBox")]
    answer_box: Option<SerperAnswerBox>,
}

#[derive(Deserialize)]
struct SerperOrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    link: String,
}

#[derive(Deserialize)]
struct SerperKnowledgeGraph {
    #[serde(default)]
    title: String,
    #[serde(default)]
    #[serde(rename = "type")]
    entity_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    website: String,
}

#[derive(Deserialize)]
struct SerperAnswerBox {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    snippet: String,
}

/// Top N organic results handed to the LLM — keeps the enrichment prompt
/// concise rather than dumping Serper's full page of results.
const MAX_SNIPPETS: usize = 4;
/// Truncate each snippet to keep context concise.
const MAX_SNIPPET_CHARS: usize = 400;

fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

fn truncate(s: &str, n: usize) -> String {
    if s.chars().count() <= n {
        s.to_string()
    } else {
        s.chars().take(n).collect()
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        let response = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest { q: query, num: 6, gl: "us", hl: "en" })
            .send()
            .await?
            .error_for_status()?
            .json::<SerperResponseBody>()
            .await?;

        let results = response
            .organic
            .into_iter()
            .take(MAX_SNIPPETS)
            .map(|r| SearchResult {
                title: r.title,
                snippet: truncate(&r.snippet, MAX_SNIPPET_CHARS),
                domain: extract_domain(&r.link),
                link: r.link,
            })
            .collect();

        Ok(SearchResponse {
            knowledge_graph: response.knowledge_graph.map(|kg| KnowledgeGraph {
                title: kg.title,
                entity_type: kg.entity_type,
                description: kg.description,
                website: kg.website,
            }),
            answer_box: response.answer_box.and_then(|ab| {
                if ab.answer.is_empty() && ab.snippet.is_empty() {
                    None
                } else {
                    Some(AnswerBox {
                        answer: ab.answer,
                        snippet: truncate(&ab.snippet, MAX_SNIPPET_CHARS),
                    })
                }
            }),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_domains_dedupes_in_first_seen_order() {
        let response = SearchResponse {
            knowledge_graph: None,
            answer_box: None,
            results: vec![
                SearchResult { title: "a".into(), snippet: "".into(), link: "".into(), domain: "mit.edu".into() },
                SearchResult { title: "b".into(), snippet: "".into(), link: "".into(), domain: "wikipedia.org".into() },
                SearchResult { title: "c".into(), snippet: "".into(), link: "".into(), domain: "mit.edu".into() },
            ],
        };
        assert_eq!(response.source_domains(), vec!["mit.edu", "wikipedia.org"]);
    }

    #[test]
    fn truncate_respects_char_boundary() {
        assert_eq!(truncate("hello world", 5), "hello");
        assert_eq!(truncate("hi", 5), "hi");
    }
}
