//! Per-person, per-question result persistence.
//!
//! Each person gets a directory under the store root named after their
//! directory-form name; each question result is an idempotent JSON file
//! inside it named `<PersonDir>_<suffix>.json`. Writing the same
//! `(person, suffix)` pair twice simply overwrites the file — there is no
//! append/merge semantics, matching the original batch pipeline's
//! "we always recompute full question objects" behavior.

use std::path::{Path, PathBuf};

use biorag_core::PersonName;
use serde::{de::DeserializeOwned, Serialize};

use crate::atomic::write_json_atomic;
use crate::error::StoreError;

pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, person: &PersonName, suffix: &str) -> PathBuf {
        let dir_name = person.dir_name();
        self.root
            .join(dir_name)
            .join(format!("{dir_name}_{suffix}.json"))
    }

    /// Write `value` for `(person, suffix)`, creating the person's
    /// directory if needed. Overwrites any prior result for the same pair.
    pub async fn write<T: Serialize + Sync>(
        &self,
        person: &PersonName,
        suffix: &str,
        value: &T,
    ) -> Result<PathBuf, StoreError> {
        let path = self.path_for(person, suffix);
        write_json_atomic(&path, value).await?;
        Ok(path)
    }

    /// Read back a previously-written result, if present.
    pub async fn read<T: DeserializeOwned>(
        &self,
        person: &PersonName,
        suffix: &str,
    ) -> Result<Option<T>, StoreError> {
        let path = self.path_for(person, suffix);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// True if a result already exists for `(person, suffix)` — used to
    /// skip re-running already-answered questions.
    pub async fn exists(&self, person: &PersonName, suffix: &str) -> bool {
        tokio::fs::try_exists(self.path_for(person, suffix))
            .await
            .unwrap_or(false)
    }

    pub fn person_dir(&self, person: &PersonName) -> PathBuf {
        self.root.join(person.dir_name())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let person = PersonName::from_db_name("Ada Lovelace");

        store
            .write(&person, "nationality", &json!({"answer": "British"}))
            .await
            .unwrap();

        let value: serde_json::Value = store
            .read(&person, "nationality")
            .await
            .unwrap()
            .expect("result present");
        assert_eq!(value["answer"], "British");
        assert!(store.exists(&person, "nationality").await);
    }

    #[tokio::test]
    async fn missing_result_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let person = PersonName::from_db_name("Grace Hopper");

        let value: Option<serde_json::Value> =
            store.read(&person, "birth_year").await.unwrap();
        assert!(value.is_none());
        assert!(!store.exists(&person, "birth_year").await);
    }

    #[tokio::test]
    async fn rewriting_same_pair_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path());
        let person = PersonName::from_db_name("Rosalind Franklin");

        store.write(&person, "field", &json!({"v": 1})).await.unwrap();
        store.write(&person, "field", &json!({"v": 2})).await.unwrap();

        let value: serde_json::Value =
            store.read(&person, "field").await.unwrap().unwrap();
        assert_eq!(value["v"], 2);
    }
}
