//! Conversions between the two representations of a person's name used
//! throughout the pipeline: the spaced form stored in the database
//! (`"Abhijit Banerjee"`) and the underscore form used for output
//! directories (`"Abhijit_Banerjee"`).

use std::fmt;

/// A person's name, always available in both its database and directory
/// forms. Constructing one from either form normalizes the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersonName {
    db_name: String,
    dir_name: String,
}

impl PersonName {
    /// Build from the spaced database form, e.g. `"Abhijit Banerjee"`.
    pub fn from_db_name(db_name: impl Into<String>) -> Self {
        let db_name = db_name.into();
        let dir_name = db_name.replace(' ', "_");
        Self { db_name, dir_name }
    }

    /// Build from the underscore directory/CLI-argument form, e.g.
    /// `"Abhijit_Banerjee"`. Also accepts a spaced form unchanged, since
    /// CLI users routinely pass `--person "Abhijit Banerjee"` directly.
    pub fn from_dir_name(dir_name: impl Into<String>) -> Self {
        let dir_name = dir_name.into();
        let db_name = dir_name.replace('_', " ");
        let dir_name = db_name.replace(' ', "_");
        Self { db_name, dir_name }
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.db_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_underscore_form() {
        let p = PersonName::from_dir_name("Abhijit_Banerjee");
        assert_eq!(p.db_name(), "Abhijit Banerjee");
        assert_eq!(p.dir_name(), "Abhijit_Banerjee");
    }

    #[test]
    fn accepts_spaced_cli_input() {
        let p = PersonName::from_dir_name("Abhijit Banerjee");
        assert_eq!(p.db_name(), "Abhijit Banerjee");
        assert_eq!(p.dir_name(), "Abhijit_Banerjee");
    }

    #[test]
    fn from_db_name_derives_dir_name() {
        let p = PersonName::from_db_name("Esther Duflo");
        assert_eq!(p.dir_name(), "Esther_Duflo");
    }
}
