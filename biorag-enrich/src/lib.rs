//! Enrichment Engine: fills in sector, location, and hierarchical-tag
//! fields for ontology stubs that matching could classify but not fully
//! describe, using web search evidence plus an LLM extraction pass.
//!
//! [`engine`] runs the bounded worker pool over a batch of stubs,
//! [`cache`] shares search results across workers so the same
//! organization is never searched twice in one run, [`run_file`] persists
//! progress so a killed batch can resume, and [`report`] summarizes the
//! outcome.

pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod proposal;
pub mod report;
pub mod run_file;

pub use cache::ProposalCache;
pub use engine::{enrich_batch, enrich_stub, BatchOutcome, EnrichmentProviders, EnrichmentSettings};
pub use error::EnrichError;
pub use proposal::{EnrichmentMethod, EnrichmentProposal};
pub use report::{format_summary, summarize, BatchSummary};
pub use run_file::{new_output_path, find_latest_resumable, RunArgs, RunFile};
