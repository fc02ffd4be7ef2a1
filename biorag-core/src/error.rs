use thiserror::Error;

/// Catch-all error for small utilities in `biorag-core` itself.
///
/// Subsystem crates (`biorag-store`, `biorag-rag`, `biorag-resolve`,
/// `biorag-enrich`) define their own scoped error enums rather than
/// funneling everything through one workspace-wide type.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid person name: {0}")]
    InvalidPersonName(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
