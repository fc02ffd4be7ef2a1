//! Embedding provider trait and a Cohere-backed implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether an embedding is for a stored document or a retrieval query.
///
/// Asymmetric embedding models (Cohere `embed-v4.0` among them) encode
/// these differently; using the wrong input type for a query silently
/// degrades retrieval quality rather than erroring, so the type is
/// threaded explicitly through every call site instead of being an
/// optional/defaulted parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingInputType {
    SearchDocument,
    SearchQuery,
}

impl EmbeddingInputType {
    fn as_cohere_str(self) -> &'static str {
        match self {
            Self::SearchDocument => "search_document",
            Self::SearchQuery => "search_query",
        }
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("embedding provider returned an unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

/// A provider capable of embedding one or more texts.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(
        &self,
        texts: &[String],
        input_type: EmbeddingInputType,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Cohere `embed-v4.0` over its v2 REST API.
pub struct CohereEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl CohereEmbedder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "embed-v4.0".to_string(),
        }
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
    input_type: &'static str,
    embedding_types: &'static [&'static str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: EmbedEmbeddings,
}

#[derive(Deserialize)]
struct EmbedEmbeddings {
    float: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for CohereEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        input_type: EmbeddingInputType,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let body = EmbedRequest {
            texts,
            model: &self.model,
            input_type: input_type.as_cohere_str(),
            embedding_types: &["float"],
        };

        let response = self
            .client
            .post("https://api.cohere.com/v2/embed")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbedResponse>()
            .await
            .map_err(|e| EmbeddingError::UnexpectedResponse(e.to_string()))?;

        Ok(response.embeddings.float)
    }
}
