//! Reranker provider trait and a Cohere-backed implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankError {
    #[error("rerank request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// One reranked document with its relevance score.
#[derive(Debug, Clone)]
pub struct RerankResult {
    pub index: usize,
    pub relevance_score: f32,
}

/// A provider capable of reranking a candidate document list against a
/// query. `top_n` is clamped to `documents.len()` by callers, matching the
/// original's `top_n = min(top_n, len(candidates))`.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankResult>, RerankError>;
}

/// Cohere `rerank-v3.5` over its v2 REST API.
pub struct CohereReranker {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl CohereReranker {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "rerank-v3.5".to_string(),
        }
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResponseItem>,
}

#[derive(Deserialize)]
struct RerankResponseItem {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl Reranker for CohereReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankResult>, RerankError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let top_n = top_n.min(documents.len());

        let body = RerankRequest {
            model: &self.model,
            query,
            documents,
            top_n,
        };

        let response = self
            .client
            .post("https://api.cohere.com/v2/rerank")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<RerankResponse>()
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|r| RerankResult {
                index: r.index,
                relevance_score: r.relevance_score,
            })
            .collect())
    }
}
