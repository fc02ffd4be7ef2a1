//! Builds concrete provider implementations and a chunk store from
//! [`AppConfig`], honoring the CLI's `--no-embed`/`--no-llm` overrides.
//!
//! Mirrors the teacher's checkpointer-selection-by-URL-scheme idiom: one
//! small dispatch function per backend choice, no dynamic plugin registry.

use std::sync::Arc;

use biorag_core::AppConfig;
use biorag_providers::{
    ChatLlm, CohereChat, CohereEmbedder, CohereReranker, EmbeddingProvider, Reranker,
    SearchProvider, SerperSearch,
};
use biorag_store::{ChunkStore, PostgresChunkStore, SqliteChunkStore};
use sqlx::{PgPool, SqlitePool};

use crate::error::CliError;

/// Connect a [`ChunkStore`] appropriate for `database_url`'s scheme.
pub async fn build_chunk_store(database_url: &str) -> Result<Arc<dyn ChunkStore>, CliError> {
    if database_url.starts_with("sqlite:") {
        let pool = SqlitePool::connect(database_url).await?;
        Ok(Arc::new(SqliteChunkStore::new(pool)))
    } else if database_url.starts_with("postgres:") || database_url.starts_with("postgresql:") {
        let pool = PgPool::connect(database_url).await?;
        Ok(Arc::new(PostgresChunkStore::new(pool)))
    } else {
        Err(CliError::UnknownDatabaseScheme(database_url.to_string()))
    }
}

pub fn build_embedder(config: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>, CliError> {
    let key = config
        .embedding_api_key
        .clone()
        .ok_or(biorag_core::ConfigError::MissingVar("EMBEDDING_API_KEY"))?;
    Ok(Arc::new(CohereEmbedder::new(key)))
}

pub fn build_reranker(config: &AppConfig) -> Result<Arc<dyn Reranker>, CliError> {
    let key = config
        .rerank_api_key
        .clone()
        .ok_or(biorag_core::ConfigError::MissingVar("RERANK_API_KEY"))?;
    Ok(Arc::new(CohereReranker::new(key)))
}

pub fn build_chat(config: &AppConfig) -> Result<Arc<dyn ChatLlm>, CliError> {
    let key = config.require_llm_api_key()?;
    Ok(Arc::new(CohereChat::new(key)))
}

pub fn build_search(config: &AppConfig) -> Result<Arc<dyn SearchProvider>, CliError> {
    let key = config
        .search_api_key
        .clone()
        .ok_or(biorag_core::ConfigError::MissingVar("SEARCH_API_KEY"))?;
    Ok(Arc::new(SerperSearch::new(key)))
}
