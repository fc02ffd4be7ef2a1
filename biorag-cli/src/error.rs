use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] biorag_core::ConfigError),

    #[error(transparent)]
    Store(#[from] biorag_store::StoreError),

    #[error(transparent)]
    Rag(#[from] biorag_rag::RagError),

    #[error(transparent)]
    Resolve(#[from] biorag_resolve::ResolveError),

    #[error(transparent)]
    Enrich(#[from] biorag_enrich::EnrichError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON at {path}: {source}")]
    Json {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown person: {0}")]
    UnknownPerson(String),

    #[error("no people selected: pass --person, --all, or --people-file")]
    NoPeopleSelected,

    #[error("prompts directory {0} is unreadable or missing questions.json")]
    UnreadablePromptsDir(std::path::PathBuf),

    #[error("DATABASE_URL scheme not recognized: {0}")]
    UnknownDatabaseScheme(String),
}
