//! Organization classification and ontology matching.
//!
//! ```text
//! raw org name ──► classify_org ──► Category
//!                                     │
//! OntologyStore ◄──────────────────── OrgMatcher::match_single
//!   (exact / fuzzy / embedding / llm, first terminal outcome wins)
//! ```
//!
//! [`classifier`] is synchronous and has no external dependencies; it runs
//! ahead of every other step in the cascade. [`matcher`] owns the rest of
//! the pipeline and needs an [`biorag_store::OntologyStore`] plus optional
//! embedding/chat providers.

pub mod classifier;
pub mod error;
pub mod matcher;

pub use classifier::{classify_org, Category};
pub use error::ResolveError;
pub use matcher::{MatchConfig, MatchMethod, MatchResult, OrgMatcher};
