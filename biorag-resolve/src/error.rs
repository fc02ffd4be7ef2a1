use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("ontology store error: {0}")]
    Store(#[from] biorag_store::StoreError),

    #[error("embedding provider error: {0}")]
    Embedding(#[from] biorag_providers::EmbeddingError),

    #[error("chat provider error: {0}")]
    Chat(#[from] biorag_providers::ChatError),
}
