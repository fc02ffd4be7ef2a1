//! Shared search-result cache, keyed by case-folded canonical name.
//!
//! Grounded on `enrichment.py`'s `_load_cache`/`_save_cache`/`_cache_key`
//! (a single JSON file, read-modify-write under a thread lock) and on
//! `wg-ragsmith::ingestion::resume::ResumeTracker`'s
//! load-once/persist-on-write shape — here the lock is a `tokio::Mutex`
//! since workers are tasks, not OS threads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use biorag_providers::SearchResponse;
use biorag_store::atomic::write_json_atomic;
use tokio::sync::Mutex;

fn cache_key(canonical_name: &str) -> String {
    canonical_name.trim().to_lowercase()
}

/// Search results already fetched for a canonical name, shared across
/// every enrichment worker. Reads and writes are serialized by a single
/// internal lock — matching the original's thread-safe cache wrapper.
#[derive(Clone)]
pub struct ProposalCache {
    path: PathBuf,
    entries: Arc<Mutex<HashMap<String, SearchResponse>>>,
}

impl ProposalCache {
    /// Load `path` if it exists; a missing or unreadable file starts empty
    /// rather than failing the batch (the original's `_load_cache` has the
    /// same best-effort behavior).
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(body) => serde_json::from_str(&body).unwrap_or_default(),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: Arc::new(Mutex::new(entries)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached result for `canonical_name`, if present.
    pub async fn get(&self, canonical_name: &str) -> Option<SearchResponse> {
        self.entries.lock().await.get(&cache_key(canonical_name)).cloned()
    }

    /// Insert a fresh result and persist the whole cache atomically. Cache
    /// write failures are logged, not propagated — a cache miss next run
    /// is cheaper than failing the batch over cache I/O.
    pub async fn put(&self, canonical_name: &str, response: SearchResponse) {
        let mut guard = self.entries.lock().await;
        guard.insert(cache_key(canonical_name), response);
        if let Err(error) = write_json_atomic(&self.path, &*guard).await {
            tracing::warn!(%error, "failed to persist enrichment cache");
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[allow(dead_code)]
fn assert_send_sync<T: Send + Sync>() {}

const _: fn() = || {
    assert_send_sync::<ProposalCache>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_cache_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProposalCache::load(dir.path().join("enrichment_cache.json")).await;
        assert_eq!(cache.len().await, 0);
        assert!(cache.get("anything").await.is_none());
    }

    #[tokio::test]
    async fn put_then_get_round_trips_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ProposalCache::load(dir.path().join("enrichment_cache.json")).await;

        cache
            .put(
                "United Nations",
                SearchResponse {
                    knowledge_graph: None,
                    answer_box: None,
                    results: vec![],
                },
            )
            .await;

        assert!(cache.get("united nations").await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn reload_from_disk_sees_prior_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enrichment_cache.json");
        let cache = ProposalCache::load(&path).await;
        cache
            .put("J-PAL", SearchResponse { knowledge_graph: None, answer_box: None, results: vec![] })
            .await;

        let reloaded = ProposalCache::load(&path).await;
        assert!(reloaded.get("j-pal").await.is_some());
    }
}
