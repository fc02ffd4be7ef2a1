use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("ontology store I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ontology document at {path} is missing the 'unified_ontology' root key")]
    MissingRoot { path: std::path::PathBuf },

    #[error("failed to (de)serialize ontology JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("no ontology entry found for canonical name '{0}'")]
    EntryNotFound(String),

    #[error("parent reference '{parent}' would create a cycle for entry '{entry}'")]
    ParentCycle { entry: String, parent: String },
}
