//! In-memory, index-backed ontology store, persisted as a single JSON
//! document rooted at `"unified_ontology"`.
//!
//! Four indexes are rebuilt on every load and every write:
//!
//! - canonical name → entry (case-folded)
//! - alias / variation → entry (case-folded)
//! - meta-type → entries
//! - hierarchical-tag prefix → full tags (a trie built by splitting each
//!   tag on `:`, so `"gov:ministry:finance"` is reachable from the prefixes
//!   `"gov"`, `"gov:ministry"`, and itself; the empty-string prefix
//!   aggregates every tag for completion-at-nothing-typed).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::atomic::write_json_atomic;
use crate::error::StoreError;

/// One organization in the ontology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyEntry {
    pub canonical_name: String,
    pub meta_type: String,
    #[serde(default)]
    pub variations_found: Vec<String>,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub org_types: Vec<String>,
    #[serde(default)]
    pub hierarchical_tags: Vec<String>,
    #[serde(default)]
    pub canonical_tag: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_source() -> String {
    "curated".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OntologyDocument {
    unified_ontology: Vec<OntologyEntry>,
}

/// Index-backed, atomically-persisted ontology.
pub struct OntologyStore {
    path: PathBuf,
    entries: Vec<OntologyEntry>,
    canonical_index: HashMap<String, usize>,
    variation_index: HashMap<String, usize>,
    meta_type_index: HashMap<String, Vec<usize>>,
    tag_index: HashMap<String, Vec<String>>,
}

impl OntologyStore {
    /// Load from `path`. The document must have a `unified_ontology` root
    /// array; any other shape is a [`StoreError::MissingRoot`].
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        let doc: serde_json::Value = serde_json::from_str(&body)?;
        let Some(raw_entries) = doc.get("unified_ontology") else {
            return Err(StoreError::MissingRoot { path });
        };
        let entries: Vec<OntologyEntry> = serde_json::from_value(raw_entries.clone())?;

        let mut store = Self {
            path,
            entries,
            canonical_index: HashMap::new(),
            variation_index: HashMap::new(),
            meta_type_index: HashMap::new(),
            tag_index: HashMap::new(),
        };
        store.build_indexes();
        Ok(store)
    }

    fn build_indexes(&mut self) {
        self.canonical_index.clear();
        self.variation_index.clear();
        self.meta_type_index.clear();
        self.tag_index.clear();

        for (i, entry) in self.entries.iter().enumerate() {
            self.canonical_index
                .insert(fold(&entry.canonical_name), i);
            for variation in &entry.variations_found {
                self.variation_index.insert(fold(variation), i);
            }
            self.meta_type_index
                .entry(entry.meta_type.clone())
                .or_default()
                .push(i);

            for tag in &entry.hierarchical_tags {
                self.tag_index.entry(String::new()).or_default().push(tag.clone());
                let parts: Vec<&str> = tag.split(':').collect();
                for depth in 1..=parts.len() {
                    let prefix = parts[..depth].join(":");
                    self.tag_index.entry(prefix).or_default().push(tag.clone());
                }
            }
        }
    }

    pub fn get_all(&self) -> &[OntologyEntry] {
        &self.entries
    }

    pub fn get_by_meta_type(&self, meta_type: &str) -> Vec<&OntologyEntry> {
        self.meta_type_index
            .get(meta_type)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
            .collect()
    }

    pub fn lookup_canonical(&self, name: &str) -> Option<&OntologyEntry> {
        self.canonical_index.get(&fold(name)).map(|&i| &self.entries[i])
    }

    pub fn lookup_variation(&self, name: &str) -> Option<&OntologyEntry> {
        self.variation_index.get(&fold(name)).map(|&i| &self.entries[i])
    }

    pub fn get_all_tags(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.canonical_tag.as_deref())
            .collect()
    }

    /// Case-insensitive prefix completion over hierarchical tags.
    pub fn get_tag_completions(&self, prefix: &str) -> Vec<String> {
        let key = prefix.to_lowercase();
        let mut tags: Vec<String> = self
            .tag_index
            .iter()
            .filter(|(k, _)| k.to_lowercase() == key)
            .flat_map(|(_, v)| v.clone())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Entries awaiting enrichment: auto-created stubs or anything flagged
    /// for review.
    pub fn get_stubs(&self) -> Vec<&OntologyEntry> {
        self.entries
            .iter()
            .filter(|e| e.source == "auto_stub" || e.status == "pending_review")
            .collect()
    }

    /// Stubs still worth enriching — excludes ones a human has already
    /// resolved one way or another.
    pub fn get_pending_stubs(&self) -> Vec<&OntologyEntry> {
        self.get_stubs()
            .into_iter()
            .filter(|e| !matches!(e.status.as_str(), "dismissed" | "merged" | "completed"))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Append one entry and rebuild indexes.
    pub fn add_entry(&mut self, entry: OntologyEntry) {
        self.entries.push(entry);
        self.build_indexes();
    }

    /// Append many entries in one rebuild pass.
    pub fn add_entries(&mut self, entries: impl IntoIterator<Item = OntologyEntry>) {
        self.entries.extend(entries);
        self.build_indexes();
    }

    /// Apply field updates to the entry named `canonical_name`. A `parent`
    /// update is rejected if it would create a cycle. Returns whether an
    /// entry was found and updated.
    pub fn update_entry(
        &mut self,
        canonical_name: &str,
        new_parent: Option<String>,
        new_status: Option<String>,
        new_meta_type: Option<String>,
    ) -> Result<bool, StoreError> {
        let Some(&idx) = self.canonical_index.get(&fold(canonical_name)) else {
            return Ok(false);
        };

        if let Some(ref parent) = new_parent {
            self.check_no_cycle(canonical_name, parent)?;
        }

        let entry = &mut self.entries[idx];
        if let Some(parent) = new_parent {
            entry.parent = Some(parent);
        }
        if let Some(status) = new_status {
            entry.status = status;
        }
        if let Some(meta_type) = new_meta_type {
            entry.meta_type = meta_type;
        }

        self.build_indexes();
        Ok(true)
    }

    /// Walk the proposed parent chain starting from `parent`; error if it
    /// ever reaches back to `entry_name`.
    fn check_no_cycle(&self, entry_name: &str, parent: &str) -> Result<(), StoreError> {
        let mut current = parent.to_string();
        let mut seen = std::collections::HashSet::new();
        loop {
            if fold(&current) == fold(entry_name) {
                return Err(StoreError::ParentCycle {
                    entry: entry_name.to_string(),
                    parent: parent.to_string(),
                });
            }
            if !seen.insert(fold(&current)) {
                // Cycle already present elsewhere in the graph; stop walking.
                break;
            }
            match self.lookup_canonical(&current).and_then(|e| e.parent.clone()) {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(())
    }

    /// Persist the current in-memory state via write-to-temp-then-rename.
    pub async fn save(&self) -> Result<(), StoreError> {
        let doc = OntologyDocument {
            unified_ontology: self.entries.clone(),
        };
        write_json_atomic(&self.path, &doc).await
    }

    /// Discard in-memory mutations and reload from disk.
    pub async fn reload(&mut self) -> Result<(), StoreError> {
        let reloaded = Self::load(&self.path).await?;
        *self = reloaded;
        Ok(())
    }
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn write_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("unified_ontology.json");
        let doc = json!({
            "unified_ontology": [
                {
                    "canonical_name": "United Nations",
                    "meta_type": "io",
                    "variations_found": ["UN", "U.N."],
                    "hierarchical_tags": ["io:un_system"],
                    "canonical_tag": "io:un_system",
                    "source": "curated",
                    "status": "active"
                },
                {
                    "canonical_name": "World Bank Regional Office",
                    "meta_type": "io",
                    "variations_found": [],
                    "hierarchical_tags": [],
                    "source": "auto_stub",
                    "status": "pending_review"
                }
            ]
        });
        tokio::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap())
            .await
            .unwrap();
        path
    }

    #[tokio::test]
    async fn loads_and_indexes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path()).await;
        let store = OntologyStore::load(&path).await.unwrap();

        assert_eq!(store.count(), 2);
        assert!(store.lookup_canonical("united nations").is_some());
        assert!(store.lookup_variation("un").is_some());
        assert_eq!(store.get_pending_stubs().len(), 1);
    }

    #[tokio::test]
    async fn missing_root_key_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"{}").await.unwrap();

        let result = OntologyStore::load(&path).await;
        assert!(matches!(result, Err(StoreError::MissingRoot { .. })));
    }

    #[tokio::test]
    async fn update_entry_rejects_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path()).await;
        let mut store = OntologyStore::load(&path).await.unwrap();

        store
            .update_entry(
                "World Bank Regional Office",
                Some("United Nations".to_string()),
                None,
                None,
            )
            .unwrap();

        let result = store.update_entry(
            "United Nations",
            Some("World Bank Regional Office".to_string()),
            None,
            None,
        );
        assert!(matches!(result, Err(StoreError::ParentCycle { .. })));
    }

    #[tokio::test]
    async fn save_then_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path()).await;
        let mut store = OntologyStore::load(&path).await.unwrap();

        store.add_entry(OntologyEntry {
            canonical_name: "Acme Foundation".to_string(),
            meta_type: "ngo".to_string(),
            variations_found: vec![],
            sector: "ngo".to_string(),
            country: None,
            city: None,
            org_types: vec!["ngo".to_string()],
            hierarchical_tags: vec![],
            canonical_tag: None,
            parent: None,
            source: "curated".to_string(),
            status: "active".to_string(),
        });
        store.save().await.unwrap();
        store.reload().await.unwrap();

        assert_eq!(store.count(), 3);
        assert!(store.lookup_canonical("Acme Foundation").is_some());
    }
}
