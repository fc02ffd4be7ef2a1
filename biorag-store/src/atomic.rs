//! Write-to-temp-then-rename, the one place all three persisted stores
//! (ontology, result, sidecar) get their durability from. A crash mid-write
//! leaves either the old file or the new one on disk, never a half-written
//! one.

use std::path::Path;

use crate::error::StoreError;

/// Serialize `value` to pretty JSON and atomically replace `path` with it.
///
/// The temp file is created in the same directory as `path` so the final
/// `rename` is guaranteed to be on the same filesystem (and therefore
/// atomic on POSIX). The temp file is removed if any step before the
/// rename fails.
pub async fn write_json_atomic<T: serde::Serialize + Sync>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    let body = serde_json::to_vec_pretty(value)?;

    let tmp_path = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
    if let Err(source) = tokio::fs::write(&tmp_path, &body).await {
        return Err(StoreError::Io {
            path: tmp_path,
            source,
        });
    }

    if let Err(source) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        write_json_atomic(&path, &json!({"a": 1})).await.unwrap();

        let body = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[tokio::test]
    async fn no_tmp_file_left_behind_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &json!({"ok": true})).await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().into_string().unwrap());
        }
        assert_eq!(names, vec!["doc.json"]);
    }
}
