//! Vector Ranker: person-scoped chunk retrieval, cosine scoring, and
//! rerank-with-fallback.
//!
//! Mirrors `retrieval.py`: fetch every chunk on file for a person, embed
//! the query as a `search_query`, keep chunks at or above a similarity
//! floor, hand the survivors to a reranker, and fall back to similarity
//! order (with no rerank score) if the reranker call fails rather than
//! losing the retrieval entirely.

use biorag_providers::{EmbeddingInputType, EmbeddingProvider, Reranker};
use biorag_store::{Chunk, ChunkStore};

use crate::error::RagError;

/// One retrieved chunk, annotated with its similarity score, optional
/// rerank score, and the domain its source URL resolved to.
#[derive(Debug, Clone)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub similarity: f64,
    pub rerank_score: Option<f32>,
    pub domain: String,
}

/// Tunables for [`retrieve_for_person`]. Defaults match the original's
/// `top_k=20`, `min_similarity=0.15`.
#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub similarity_top_k: usize,
    pub min_similarity: f64,
    pub rerank_top_n: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            similarity_top_k: 20,
            min_similarity: 0.15,
            rerank_top_n: 10,
        }
    }
}

/// Cosine similarity between two vectors; a zero-norm vector (never
/// expected from a real embedding, but possible from a malformed or
/// missing one) scores `0.0` rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

/// Extracts the host from a URL, stripping a leading `www.`; an
/// unparseable URL contributes an empty domain rather than an error.
pub fn extract_domain(raw_url: &str) -> String {
    url::Url::parse(raw_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

/// Retrieve, score, and rerank the chunks on file for `person_name`
/// against `query`. Returns an empty vec if the person has no chunks at
/// all, or if nothing clears `min_similarity`.
pub async fn retrieve_for_person(
    store: &dyn ChunkStore,
    embedder: &dyn EmbeddingProvider,
    reranker: &dyn Reranker,
    person_name: &str,
    query: &str,
    config: &RankerConfig,
) -> Result<Vec<RankedChunk>, RagError> {
    let chunks = store.chunks_for_person(person_name).await?;
    if chunks.is_empty() {
        return Ok(Vec::new());
    }

    let query_embedding = embedder
        .embed(&[query.to_string()], EmbeddingInputType::SearchQuery)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();

    let mut scored: Vec<(Chunk, f64)> = chunks
        .into_iter()
        .map(|chunk| {
            let similarity = cosine_similarity(&query_embedding, &chunk.embedding);
            (chunk, similarity)
        })
        .filter(|(_, similarity)| *similarity >= config.min_similarity)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(config.similarity_top_k);

    if scored.is_empty() {
        return Ok(Vec::new());
    }

    let documents: Vec<String> = scored.iter().map(|(c, _)| c.text.clone()).collect();
    let rerank_top_n = config.rerank_top_n.min(scored.len());

    let ranked = match reranker.rerank(query, &documents, rerank_top_n).await {
        Ok(results) => results
            .into_iter()
            .filter_map(|r| scored.get(r.index).map(|(c, sim)| (c.clone(), *sim, Some(r.relevance_score))))
            .collect::<Vec<_>>(),
        Err(error) => {
            tracing::warn!(%error, "reranker call failed, falling back to similarity order");
            scored
                .iter()
                .take(rerank_top_n)
                .map(|(c, sim)| (c.clone(), *sim, None))
                .collect()
        }
    };

    Ok(ranked
        .into_iter()
        .map(|(chunk, similarity, rerank_score)| {
            let domain = extract_domain(&chunk.url);
            RankedChunk {
                chunk,
                similarity,
                rerank_score,
                domain,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use biorag_providers::{EmbeddingError, RerankError, RerankResult};
    use biorag_store::StoreError;

    struct FixedChunkStore(Vec<Chunk>);

    #[async_trait]
    impl ChunkStore for FixedChunkStore {
        async fn chunks_for_person(&self, _person_name: &str) -> Result<Vec<Chunk>, StoreError> {
            Ok(self.0.clone())
        }
        async fn count(&self) -> Result<i64, StoreError> {
            Ok(self.0.len() as i64)
        }
    }

    struct IdentityEmbedder;

    #[async_trait]
    impl EmbeddingProvider for IdentityEmbedder {
        async fn embed(
            &self,
            texts: &[String],
            _input_type: EmbeddingInputType,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct FailingReranker;

    #[async_trait]
    impl Reranker for FailingReranker {
        async fn rerank(
            &self,
            _query: &str,
            _documents: &[String],
            _top_n: usize,
        ) -> Result<Vec<RerankResult>, RerankError> {
            // A refused localhost connection is a cheap, network-free way to
            // manufacture a real `reqwest::Error` for the fallback path.
            let error = reqwest::Client::new()
                .get("http://127.0.0.1:1")
                .send()
                .await
                .unwrap_err();
            Err(RerankError::Request(error))
        }
    }

    struct PassThroughReranker;

    #[async_trait]
    impl Reranker for PassThroughReranker {
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
                    relevance_score: 1.0 - i as f32 * 0.1,
                })
                .collect())
        }
    }

    fn chunk(id: i64, embedding: Vec<f32>) -> Chunk {
        Chunk {
            chunk_id: id,
            text: format!("chunk {id}"),
            chunk_index: 0,
            token_count: 10,
            source_id: id,
            url: "https://www.example.org/page".to_string(),
            title: "title".to_string(),
            rank: 1,
            embedding,
            embedding_model: "test".to_string(),
        }
    }

    #[test]
    fn cosine_similarity_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn extract_domain_strips_www() {
        assert_eq!(extract_domain("https://www.example.org/page"), "example.org");
        assert_eq!(extract_domain("not a url"), "");
    }

    #[tokio::test]
    async fn empty_person_returns_empty() {
        let store = FixedChunkStore(Vec::new());
        let result = retrieve_for_person(
            &store,
            &IdentityEmbedder,
            &PassThroughReranker,
            "Nobody",
            "query",
            &RankerConfig::default(),
        )
        .await
        .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn below_threshold_chunks_are_excluded() {
        let store = FixedChunkStore(vec![chunk(1, vec![0.0, 1.0])]);
        let result = retrieve_for_person(
            &store,
            &IdentityEmbedder,
            &PassThroughReranker,
            "Someone",
            "query",
            &RankerConfig::default(),
        )
        .await
        .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn reranker_failure_falls_back_to_similarity_order() {
        let store = FixedChunkStore(vec![chunk(1, vec![1.0, 0.0]), chunk(2, vec![1.0, 0.0])]);
        let result = retrieve_for_person(
            &store,
            &IdentityEmbedder,
            &FailingReranker,
            "Someone",
            "query",
            &RankerConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|r| r.rerank_score.is_none()));
    }

    #[tokio::test]
    async fn successful_rerank_populates_score() {
        let store = FixedChunkStore(vec![chunk(1, vec![1.0, 0.0])]);
        let result = retrieve_for_person(
            &store,
            &IdentityEmbedder,
            &PassThroughReranker,
            "Someone",
            "query",
            &RankerConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].rerank_score.is_some());
        assert_eq!(result[0].domain, "example.org");
    }
}
