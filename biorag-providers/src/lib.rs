//! Pluggable provider interfaces for the four external capabilities the
//! pipeline depends on: embedding, reranking, chat-LLM completion, and web
//! search. Each capability is a small trait with one async method and a
//! scoped error type, so swapping a vendor means writing one new struct.
//!
//! [`mock`] provides deterministic in-memory implementations of every trait
//! for orchestration-level tests that must not touch the network.

pub mod chat;
pub mod embedding;
pub mod json_extract;
pub mod mock;
pub mod rerank;
pub mod search;

pub use chat::{ChatError, ChatLlm, ChatRequest, ChatResponse, CohereChat};
pub use embedding::{CohereEmbedder, EmbeddingError, EmbeddingInputType, EmbeddingProvider};
pub use rerank::{CohereReranker, RerankError, RerankResult, Reranker};
pub use search::{
    AnswerBox, KnowledgeGraph, SearchError, SearchProvider, SearchResponse, SearchResult,
    SerperSearch,
};
