//! Shared plumbing behind the three CLI binaries: person selection,
//! question-manifest loading, base-record loading, provider construction,
//! and the `QuestionJob` implementations that tie them together.

pub mod base_record;
pub mod career;
pub mod error;
pub mod jobs;
pub mod people;
pub mod providers;
pub mod questions;

pub use error::CliError;
