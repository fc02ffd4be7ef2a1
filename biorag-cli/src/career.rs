//! Reads `data/<PersonDir>/<PersonDir>_career_events.json`, the adjacent
//! timeline store the matching orchestrator walks. Out of scope as a
//! component per spec — only its input shape matters here: a list of
//! career events, each naming one free-text organization mention.

use std::path::{Path, PathBuf};

use biorag_core::PersonName;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareerEvent {
    #[serde(default)]
    pub job_title: Option<String>,
    pub organization: String,
    #[serde(default)]
    pub period: Option<String>,
}

pub fn career_events_path(data_dir: &Path, person: &PersonName) -> PathBuf {
    let dir_name = person.dir_name();
    data_dir.join(dir_name).join(format!("{dir_name}_career_events.json"))
}

/// The sidecar path spec §6 names for this person: `<PersonDir>_org_links.json`
/// next to the career-events file, not the generic `.sidecar.json` suffix
/// [`biorag_store::SidecarWriter`] uses for arbitrary originals.
pub fn org_links_path(data_dir: &Path, person: &PersonName) -> PathBuf {
    let dir_name = person.dir_name();
    data_dir.join(dir_name).join(format!("{dir_name}_org_links.json"))
}

/// Load career events for `person`. A missing file yields an empty list —
/// a person with no recorded career timeline simply has nothing to match.
pub async fn load_career_events(
    data_dir: &Path,
    person: &PersonName,
) -> Result<Vec<CareerEvent>, CliError> {
    let path = career_events_path(data_dir, person);
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => serde_json::from_str(&body).map_err(|source| CliError::Json { path, source }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(CliError::Io { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_career_events_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let person = PersonName::from_db_name("Ada Lovelace");
        let events = load_career_events(dir.path(), &person).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn present_career_events_file_parses_entries() {
        let dir = tempfile::tempdir().unwrap();
        let person = PersonName::from_db_name("Ada Lovelace");
        let person_dir = dir.path().join("Ada_Lovelace");
        tokio::fs::create_dir(&person_dir).await.unwrap();
        tokio::fs::write(
            person_dir.join("Ada_Lovelace_career_events.json"),
            serde_json::json!([
                {"job_title": "Mathematician", "organization": "University of Oxford"}
            ])
            .to_string(),
        )
        .await
        .unwrap();

        let events = load_career_events(dir.path(), &person).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].organization, "University of Oxford");
    }
}
