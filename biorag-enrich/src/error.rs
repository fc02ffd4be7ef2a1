use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("ontology store error: {0}")]
    Store(#[from] biorag_store::StoreError),

    #[error("run file I/O error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize run file JSON: {0}")]
    Serde(#[from] serde_json::Error),
}
