//! Persistence layer for the biographical research pipeline.
//!
//! ```text
//! sources.persons / search_results / chunks / embeddings ──► ChunkStore
//!                                                              │
//! unified_ontology.json ──► OntologyStore ◄───────────────────┘ (matcher, classifier)
//!
//! outputs/<Person>/<Person>_<suffix>.json ──► ResultStore
//! <career-events file>.sidecar.json        ──► SidecarWriter
//! ```
//!
//! [`atomic`] provides the single write-to-temp-then-rename helper shared
//! by the ontology store, result store, and sidecar writer — one place for
//! the durability discipline instead of three copies of it.

pub mod atomic;
pub mod chunk_store;
pub mod error;
pub mod ontology;
pub mod results;
pub mod sidecar;

pub use chunk_store::{Chunk, ChunkStore, PostgresChunkStore, SqliteChunkStore};
pub use error::StoreError;
pub use ontology::{OntologyEntry, OntologyStore};
pub use results::ResultStore;
pub use sidecar::SidecarWriter;
