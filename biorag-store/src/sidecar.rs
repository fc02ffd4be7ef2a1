//! Sidecar JSON files written next to the career-events file they
//! annotate, e.g. `careers/Ada_Lovelace.json` gets a sibling
//! `careers/Ada_Lovelace.sidecar.json` carrying enrichment metadata
//! (classifier proposals, confidence, matched ontology entries) without
//! touching the original file.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::atomic::write_json_atomic;
use crate::error::StoreError;

pub struct SidecarWriter;

impl SidecarWriter {
    /// The sidecar path for `original`: same directory and stem, with
    /// `.sidecar.json` appended to the full original file name.
    pub fn sidecar_path(original: &Path) -> PathBuf {
        let mut name = original
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".sidecar.json");
        original.with_file_name(name)
    }

    /// Write `value` as the sidecar for `original`, atomically.
    pub async fn write<T: Serialize + Sync>(
        original: &Path,
        value: &T,
    ) -> Result<PathBuf, StoreError> {
        let path = Self::sidecar_path(original);
        write_json_atomic(&path, value).await?;
        Ok(path)
    }

    /// Read a sidecar's contents as a free-form JSON value, if present.
    pub async fn read(original: &Path) -> Result<Option<serde_json::Value>, StoreError> {
        let path = Self::sidecar_path(original);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sidecar_path_appends_suffix() {
        let original = Path::new("/data/careers/Ada_Lovelace.json");
        let sidecar = SidecarWriter::sidecar_path(original);
        assert_eq!(
            sidecar,
            Path::new("/data/careers/Ada_Lovelace.json.sidecar.json")
        );
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("Ada_Lovelace.json");
        tokio::fs::write(&original, b"{}").await.unwrap();

        SidecarWriter::write(&original, &json!({"meta_type": "government"}))
            .await
            .unwrap();

        let value = SidecarWriter::read(&original).await.unwrap().unwrap();
        assert_eq!(value["meta_type"], "government");
    }

    #[tokio::test]
    async fn missing_sidecar_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("Grace_Hopper.json");
        let value = SidecarWriter::read(&original).await.unwrap();
        assert!(value.is_none());
    }
}
