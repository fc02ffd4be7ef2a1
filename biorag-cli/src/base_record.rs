//! Loads `data/<PersonDir>/<PersonDir>_base.json`, the per-person record
//! supplying the `{{HLP_NAME}}`/`{{NOMINATION_YEAR}}`/`{{NOMINATION_AGE}}`
//! placeholders threaded into every extraction and verification prompt.

use std::path::Path;

use biorag_core::PersonName;
use biorag_rag::QuestionContext;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonBaseRecord {
    pub person_name: String,
    #[serde(default)]
    pub hlp_name: String,
    #[serde(default)]
    pub nomination_year: Option<String>,
    #[serde(default)]
    pub birth_year: Option<String>,
    /// Every other base-record field, kept around so a skip predicate can
    /// check fields this struct doesn't name explicitly.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PersonBaseRecord {
    /// True if `field` is missing or explicitly `null`, matching the
    /// original's `base_data.get(field) is None` check — known fields are
    /// checked directly, anything else falls back to `extra`.
    pub fn field_is_null(&self, field: &str) -> bool {
        match field {
            "person_name" | "hlp_name" => false,
            "nomination_year" => self.nomination_year.is_none(),
            "birth_year" => self.birth_year.is_none(),
            other => self.extra.get(other).is_none_or(|v| v.is_null()),
        }
    }
}

impl PersonBaseRecord {
    /// Age at nomination, derived from `nomination_year` and `birth_year`
    /// when both parse as four-digit years; `None` otherwise (the runner
    /// treats an unresolved age the same as an absent one).
    pub fn nomination_age(&self) -> Option<i32> {
        let nomination = self
            .nomination_year
            .as_deref()
            .and_then(parse_nomination_year)?;
        let birth = self.birth_year.as_deref().and_then(parse_nomination_year)?;
        Some(nomination - birth)
    }

    pub fn to_question_context(&self) -> QuestionContext {
        QuestionContext {
            person_name: self.person_name.clone(),
            hlp_name: self.hlp_name.clone(),
            nomination_year: self
                .nomination_year
                .as_deref()
                .and_then(parse_nomination_year)
                .map(|y| y.to_string())
                .unwrap_or_default(),
            nomination_age: self.nomination_age().map(|a| a.to_string()).unwrap_or_default(),
        }
    }
}

/// Pull the first plausible four-digit year (1900-2099) out of a
/// free-form string, e.g. `"2019"`, `"October 2019"`, or `"2019-10-14"`.
pub fn parse_nomination_year(raw: &str) -> Option<i32> {
    let bytes: Vec<char> = raw.chars().collect();
    for window in bytes.windows(4) {
        if window.iter().all(|c| c.is_ascii_digit()) {
            let year: i32 = window.iter().collect::<String>().parse().ok()?;
            if (1900..=2099).contains(&year) {
                return Some(year);
            }
        }
    }
    None
}

fn base_record_path(data_dir: &Path, person: &PersonName) -> std::path::PathBuf {
    let dir_name = person.dir_name();
    data_dir.join(dir_name).join(format!("{dir_name}_base.json"))
}

/// Load the base record for `person`. A missing file is not an error —
/// callers fall back to an all-empty [`QuestionContext`], since the
/// person-name placeholder alone is still usable.
pub async fn load_base_record(
    data_dir: &Path,
    person: &PersonName,
) -> Result<PersonBaseRecord, CliError> {
    let path = base_record_path(data_dir, person);
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => {
            serde_json::from_str(&body).map_err(|source| CliError::Json { path, source })
        }
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(PersonBaseRecord {
            person_name: person.db_name().to_string(),
            ..Default::default()
        }),
        Err(source) => Err(CliError::Io { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nomination_year_finds_first_plausible_year() {
        assert_eq!(parse_nomination_year("2019"), Some(2019));
        assert_eq!(parse_nomination_year("October 2019, nominated"), Some(2019));
        assert_eq!(parse_nomination_year("2019-10-14"), Some(2019));
        assert_eq!(parse_nomination_year("not a year"), None);
        assert_eq!(parse_nomination_year("3000"), None);
    }

    #[test]
    fn nomination_age_subtracts_birth_from_nomination() {
        let record = PersonBaseRecord {
            person_name: "Ada Lovelace".to_string(),
            hlp_name: "Ada".to_string(),
            nomination_year: Some("2019".to_string()),
            birth_year: Some("1985".to_string()),
            extra: serde_json::Map::new(),
        };
        assert_eq!(record.nomination_age(), Some(34));
    }

    #[test]
    fn nomination_age_none_when_birth_year_missing() {
        let record = PersonBaseRecord {
            person_name: "Ada Lovelace".to_string(),
            hlp_name: "Ada".to_string(),
            nomination_year: Some("2019".to_string()),
            birth_year: None,
            extra: serde_json::Map::new(),
        };
        assert_eq!(record.nomination_age(), None);
    }

    #[test]
    fn field_is_null_checks_known_and_extra_fields() {
        let mut extra = serde_json::Map::new();
        extra.insert("country".to_string(), serde_json::Value::Null);
        extra.insert("hometown".to_string(), serde_json::Value::String("Lagos".to_string()));
        let record = PersonBaseRecord {
            person_name: "Ada Lovelace".to_string(),
            hlp_name: "Ada".to_string(),
            nomination_year: None,
            birth_year: Some("1985".to_string()),
            extra,
        };
        assert!(record.field_is_null("nomination_year"));
        assert!(!record.field_is_null("birth_year"));
        assert!(record.field_is_null("country"));
        assert!(!record.field_is_null("hometown"));
        assert!(record.field_is_null("never_seen_field"));
    }

    #[tokio::test]
    async fn missing_base_record_falls_back_to_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let person = PersonName::from_db_name("Ada Lovelace");
        let record = load_base_record(dir.path(), &person).await.unwrap();
        assert_eq!(record.person_name, "Ada Lovelace");
        assert_eq!(record.hlp_name, "");
    }

    #[tokio::test]
    async fn present_base_record_loads_fields() {
        let dir = tempfile::tempdir().unwrap();
        let person = PersonName::from_db_name("Ada Lovelace");
        let person_dir = dir.path().join("Ada_Lovelace");
        tokio::fs::create_dir(&person_dir).await.unwrap();
        tokio::fs::write(
            person_dir.join("Ada_Lovelace_base.json"),
            serde_json::json!({
                "person_name": "Ada Lovelace",
                "hlp_name": "Ada",
                "nomination_year": "2019",
                "birth_year": "1985"
            })
            .to_string(),
        )
        .await
        .unwrap();

        let record = load_base_record(dir.path(), &person).await.unwrap();
        assert_eq!(record.hlp_name, "Ada");
        assert_eq!(record.nomination_age(), Some(34));
    }
}
