use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("chunk store error: {0}")]
    Store(#[from] biorag_store::StoreError),

    #[error("embedding provider error: {0}")]
    Embedding(#[from] biorag_providers::EmbeddingError),

    #[error("rerank provider error: {0}")]
    Rerank(#[from] biorag_providers::RerankError),

    #[error("chat provider error: {0}")]
    Chat(#[from] biorag_providers::ChatError),
}
