//! Resolving `--person`/`--all`/`--people-file` into a concrete list of
//! people to process, per spec §6's CLI contract: name inputs accept
//! either spaced or underscore form and are normalized internally.

use std::path::Path;

use biorag_core::PersonName;

use crate::error::CliError;

/// Input selection from the three mutually-supplementing CLI flags.
/// `--all` wins over explicit names when both are given, since a caller
/// asking for everything has already made the broader choice.
pub struct PersonSelection<'a> {
    pub person: &'a [String],
    pub all: bool,
    pub people_file: Option<&'a Path>,
}

/// Resolve a [`PersonSelection`] into a sorted, de-duplicated list of
/// people. `--all` scans `data_dir` for `<PersonDir>/<PersonDir>_base.json`
/// entries; explicit names or a people-file are normalized via
/// [`PersonName::from_dir_name`] without touching the filesystem.
pub async fn resolve_people(
    selection: PersonSelection<'_>,
    data_dir: &Path,
) -> Result<Vec<PersonName>, CliError> {
    let mut names: Vec<PersonName> = if selection.all {
        scan_data_dir(data_dir).await?
    } else {
        let mut names: Vec<PersonName> =
            selection.person.iter().map(|p| PersonName::from_dir_name(p)).collect();

        if let Some(path) = selection.people_file {
            names.extend(read_people_file(path).await?);
        }
        names
    };

    if names.is_empty() {
        return Err(CliError::NoPeopleSelected);
    }

    names.sort_by(|a, b| a.dir_name().cmp(b.dir_name()));
    names.dedup_by(|a, b| a.dir_name() == b.dir_name());
    Ok(names)
}

async fn scan_data_dir(data_dir: &Path) -> Result<Vec<PersonName>, CliError> {
    let mut entries = tokio::fs::read_dir(data_dir).await.map_err(|source| CliError::Io {
        path: data_dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|source| CliError::Io {
        path: data_dir.to_path_buf(),
        source,
    })? {
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            if let Some(dir_name) = entry.file_name().to_str() {
                names.push(PersonName::from_dir_name(dir_name));
            }
        }
    }
    Ok(names)
}

async fn read_people_file(path: &Path) -> Result<Vec<PersonName>, CliError> {
    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;

    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PersonName::from_dir_name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn all_scans_data_dir_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("Ada_Lovelace")).await.unwrap();
        tokio::fs::create_dir(dir.path().join("Grace_Hopper")).await.unwrap();
        tokio::fs::write(dir.path().join("README.md"), "not a person").await.unwrap();

        let selection = PersonSelection { person: &[], all: true, people_file: None };
        let people = resolve_people(selection, dir.path()).await.unwrap();

        assert_eq!(people.len(), 2);
        assert!(people.iter().any(|p| p.db_name() == "Ada Lovelace"));
    }

    #[tokio::test]
    async fn explicit_names_accept_spaced_or_underscore_form() {
        let dir = tempfile::tempdir().unwrap();
        let person = vec!["Ada Lovelace".to_string(), "Grace_Hopper".to_string()];
        let selection = PersonSelection { person: &person, all: false, people_file: None };
        let people = resolve_people(selection, dir.path()).await.unwrap();

        assert_eq!(people.len(), 2);
        assert!(people.iter().any(|p| p.dir_name() == "Ada_Lovelace"));
        assert!(people.iter().any(|p| p.dir_name() == "Grace_Hopper"));
    }

    #[tokio::test]
    async fn no_selection_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let selection = PersonSelection { person: &[], all: false, people_file: None };
        let result = resolve_people(selection, dir.path()).await;
        assert!(matches!(result, Err(CliError::NoPeopleSelected)));
    }

    #[tokio::test]
    async fn people_file_lines_are_read_and_comments_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("people.txt");
        tokio::fs::write(&file, "# comment\nAda Lovelace\n\nGrace_Hopper\n").await.unwrap();

        let selection = PersonSelection { person: &[], all: false, people_file: Some(&file) };
        let people = resolve_people(selection, dir.path()).await.unwrap();
        assert_eq!(people.len(), 2);
    }
}
