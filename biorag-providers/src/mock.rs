//! Deterministic, network-free implementations of every provider trait,
//! for orchestration-level tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::chat::{ChatError, ChatLlm, ChatRequest, ChatResponse};
use crate::embedding::{EmbeddingError, EmbeddingInputType, EmbeddingProvider};
use crate::json_extract::parse_json_or_null;
use crate::rerank::{RerankError, RerankResult, Reranker};
use crate::search::{SearchError, SearchProvider, SearchResponse};

/// Embeds each text to a vector derived from its byte length and a hash of
/// its content, so cosine similarity between related mock inputs is
/// higher than between unrelated ones without needing a real model.
pub struct MockEmbedder {
    pub dim: usize,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for (i, byte) in text.bytes().enumerate() {
            v[i % self.dim] += byte as f32;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        _input_type: EmbeddingInputType,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Returns candidates in their original order with a descending synthetic
/// relevance score, so `top_n` truncation is exercisable without a real
/// reranker.
pub struct MockReranker;

#[async_trait]
impl Reranker for MockReranker {
    async fn rerank(
        &self,
        _query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankResult>, RerankError> {
        let top_n = top_n.min(documents.len());
        Ok((0..top_n)
            .map(|i| RerankResult {
                index: i,
                relevance_score: 1.0 - (i as f32 * 0.01),
            })
            .collect())
    }
}

/// Returns a canned response for each prompt substring registered via
/// [`MockChat::respond_when`], falling back to a `cannot_determine` stub.
#[derive(Default)]
pub struct MockChat {
    responses: Mutex<HashMap<String, String>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_when(&self, prompt_contains: impl Into<String>, raw_response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(prompt_contains.into(), raw_response.into());
    }
}

#[async_trait]
impl ChatLlm for MockChat {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let responses = self.responses.lock().unwrap();
        let raw_text = responses
            .iter()
            .find(|(k, _)| request.prompt.contains(k.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| r#"{"cannot_determine": true}"#.to_string());
        let parsed = parse_json_or_null(&raw_text);
        Ok(ChatResponse { raw_text, parsed })
    }
}

/// Always returns an empty result set — exercises the "no evidence found"
/// fallback path in the enrichment engine.
pub struct MockSearch;

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, _query: &str) -> Result<SearchResponse, SearchError> {
        Ok(SearchResponse::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingInputType;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(8);
        let a = embedder
            .embed(&["hello".to_string()], EmbeddingInputType::SearchQuery)
            .await
            .unwrap();
        let b = embedder
            .embed(&["hello".to_string()], EmbeddingInputType::SearchQuery)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn mock_chat_matches_registered_substring() {
        let chat = MockChat::new();
        chat.respond_when("job title", r#"{"title": "Minister"}"#);
        let resp = chat
            .complete(ChatRequest::new("What was the job title here?"))
            .await
            .unwrap();
        assert_eq!(resp.parsed.unwrap()["title"], "Minister");
    }
}
