//! Relational chunk storage.
//!
//! Four tables back every implementation:
//!
//! ```text
//! persons(id, person_name UNIQUE)
//! search_results(id, person_id FK, url, title, rank)
//! chunks(id, search_result_id FK, text, chunk_index, token_count)
//! embeddings(chunk_id FK UNIQUE, vector JSON, model TEXT)
//! ```
//!
//! [`ChunkStore`] is backend-agnostic the same way a vector-store trait
//! would be, but the query it wraps is a four-table join rather than a
//! single-table vector lookup — a single-table-per-record abstraction
//! can't express the `persons → search_results → chunks → embeddings`
//! join this schema needs, so both implementations talk to `sqlx`
//! directly instead of going through a vector-store crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row, SqlitePool};

use crate::error::StoreError;

/// One chunk of source text, joined with its embedding and the search
/// result it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: i64,
    pub text: String,
    pub chunk_index: i32,
    pub token_count: i32,
    pub source_id: i64,
    pub url: String,
    pub title: String,
    pub rank: i32,
    pub embedding: Vec<f32>,
    pub embedding_model: String,
}

/// Chunk storage and retrieval, independent of the concrete SQL backend.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// All chunks with embeddings for `person_name`, deduplicated by chunk
    /// id (a person may have more than one `search_results` row across
    /// separate search batches; the lowest `rank` wins), ordered by chunk
    /// id ascending.
    async fn chunks_for_person(&self, person_name: &str) -> Result<Vec<Chunk>, StoreError>;

    /// Total chunk count across all persons, for quick sanity checks.
    async fn count(&self) -> Result<i64, StoreError>;
}

/// Shared SQL: pull one row per `(person, chunk)` pair with its lowest
/// rank, relying on `MIN(sr.rank)` grouped by chunk id rather than
/// `DISTINCT ON` so the same query runs on both SQLite and Postgres.
const CHUNKS_FOR_PERSON_SQL: &str = r#"
SELECT
    c.id             AS chunk_id,
    c.text           AS text,
    c.chunk_index    AS chunk_index,
    c.token_count    AS token_count,
    sr.id            AS source_id,
    sr.url           AS url,
    sr.title         AS title,
    MIN(sr.rank)     AS rank,
    e.vector         AS vector,
    e.model          AS model
FROM persons p
JOIN search_results sr ON sr.person_id = p.id
JOIN chunks c           ON c.search_result_id = sr.id
JOIN embeddings e       ON e.chunk_id = c.id
WHERE p.person_name = ?
GROUP BY c.id, c.text, c.chunk_index, c.token_count, sr.id, sr.url, sr.title, e.vector, e.model
ORDER BY c.id ASC
"#;

fn parse_embedding(raw: &str) -> Vec<f32> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// SQLite-backed [`ChunkStore`].
pub struct SqliteChunkStore {
    pool: SqlitePool,
}

impl SqliteChunkStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkStore for SqliteChunkStore {
    #[tracing::instrument(skip(self))]
    async fn chunks_for_person(&self, person_name: &str) -> Result<Vec<Chunk>, StoreError> {
        let rows = sqlx::query(CHUNKS_FOR_PERSON_SQL.replace('?', "$1").as_str())
            .bind(person_name)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Chunk {
                chunk_id: row.get("chunk_id"),
                text: row.get("text"),
                chunk_index: row.get("chunk_index"),
                token_count: row.get("token_count"),
                source_id: row.get("source_id"),
                url: row.get("url"),
                title: row.get("title"),
                rank: row.get("rank"),
                embedding: parse_embedding(row.get("vector")),
                embedding_model: row.get("model"),
            })
            .collect())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

/// Postgres-backed [`ChunkStore`].
pub struct PostgresChunkStore {
    pool: PgPool,
}

impl PostgresChunkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkStore for PostgresChunkStore {
    #[tracing::instrument(skip(self))]
    async fn chunks_for_person(&self, person_name: &str) -> Result<Vec<Chunk>, StoreError> {
        let rows = sqlx::query(CHUNKS_FOR_PERSON_SQL.replace('?', "$1").as_str())
            .bind(person_name)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Chunk {
                chunk_id: row.get("chunk_id"),
                text: row.get("text"),
                chunk_index: row.get("chunk_index"),
                token_count: row.get("token_count"),
                source_id: row.get("source_id"),
                url: row.get("url"),
                title: row.get("title"),
                rank: row.get("rank"),
                embedding: parse_embedding(row.get("vector")),
                embedding_model: row.get("model"),
            })
            .collect())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}
