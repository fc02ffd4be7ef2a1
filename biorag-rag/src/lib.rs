//! Retrieval, question answering, and per-person scheduling for the
//! biographical research pipeline.
//!
//! ```text
//! ChunkStore ──► ranker::retrieve_for_person ──► question_runner passes ──► result
//!                      (cosine + rerank)         (extraction, verification)
//! ```
//!
//! [`orchestrator`] schedules RAG questions for one person concurrently
//! via a bounded `tokio::task::JoinSet`, then runs synthesis questions
//! sequentially afterward. Persons are always processed one at a time.

pub mod error;
pub mod orchestrator;
pub mod question_runner;
pub mod ranker;

pub use error::RagError;
pub use orchestrator::{PersonJobBuilder, PersonQuestionResult, QuestionJob};
pub use question_runner::{
    BestAnswerPolicy, ExtractionConfig, ExtractionOutcome, ExtractionTraceEntry, QuestionContext,
    VerificationConfig, VerificationOutcome, VerificationTraceEntry,
};
pub use ranker::{RankedChunk, RankerConfig};
