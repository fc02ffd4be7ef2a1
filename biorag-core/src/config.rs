//! Application configuration.
//!
//! ## Resolution order
//!
//! 1. A `.env` file in the current directory (loaded via [`dotenvy`], missing
//!    file is not an error — CI and containers set real env vars instead).
//! 2. Process environment variables.
//!
//! Required keys fail [`AppConfig::load`] fast, before any network or
//! filesystem work starts.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving [`AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("environment variable {key} could not be parsed: {message}")]
    InvalidVar { key: &'static str, message: String },
}

/// Resolved configuration for all three CLI binaries.
///
/// Only the fields a given binary needs are read; an embedding-less
/// classification run, for instance, never touches `embedding_api_key`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub embedding_api_key: Option<String>,
    pub rerank_api_key: Option<String>,
    pub llm_api_key: Option<String>,
    pub search_api_key: Option<String>,
    pub database_url: Option<String>,

    pub data_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub prompts_dir: PathBuf,
    pub ontology_path: PathBuf,
}

impl AppConfig {
    /// Load configuration from `.env` (if present) plus the process
    /// environment. Path roots fall back to sane defaults under the
    /// current directory when unset.
    pub fn load() -> Result<Self, ConfigError> {
        // Absence of a .env file is expected in production; only a malformed
        // one is worth surfacing, and dotenvy already logs that case.
        let _ = dotenvy::dotenv();

        Ok(Self {
            embedding_api_key: env_opt("EMBEDDING_API_KEY"),
            rerank_api_key: env_opt("RERANK_API_KEY"),
            llm_api_key: env_opt("LLM_API_KEY"),
            search_api_key: env_opt("SEARCH_API_KEY"),
            database_url: env_opt("DATABASE_URL"),
            data_dir: env_path("BIORAG_DATA_DIR", "data"),
            outputs_dir: env_path("BIORAG_OUTPUTS_DIR", "outputs"),
            prompts_dir: env_path("BIORAG_PROMPTS_DIR", "prompts"),
            ontology_path: env_path("BIORAG_ONTOLOGY_PATH", "data/unified_ontology.json"),
        })
    }

    /// `llm_api_key`, but as an error when the caller genuinely requires it
    /// (e.g. the question runner cannot proceed at all without one).
    pub fn require_llm_api_key(&self) -> Result<&str, ConfigError> {
        self.llm_api_key
            .as_deref()
            .ok_or(ConfigError::MissingVar("LLM_API_KEY"))
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingVar("DATABASE_URL"))
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_path_falls_back_to_default() {
        std::env::remove_var("BIORAG_DATA_DIR_TEST_UNSET");
        assert_eq!(env_path("BIORAG_DATA_DIR_TEST_UNSET", "data"), PathBuf::from("data"));
    }

    #[test]
    fn require_llm_api_key_errors_when_unset() {
        let cfg = AppConfig {
            embedding_api_key: None,
            rerank_api_key: None,
            llm_api_key: None,
            search_api_key: None,
            database_url: None,
            data_dir: "data".into(),
            outputs_dir: "outputs".into(),
            prompts_dir: "prompts".into(),
            ontology_path: "data/unified_ontology.json".into(),
        };
        assert!(matches!(
            cfg.require_llm_api_key(),
            Err(ConfigError::MissingVar("LLM_API_KEY"))
        ));
    }
}
