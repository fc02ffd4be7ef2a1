//! Pipeline Orchestrator: per-person two-phase question scheduling.
//!
//! Phase 1 fans the RAG questions (Q1-Q6 in the original) out across a
//! bounded worker set sized to the question count, mirroring
//! `pipeline.py`'s `ThreadPoolExecutor(max_workers=len(rag_dirs))`. Phase
//! 2 runs synthesis questions (Q7) sequentially afterward, since they read
//! Phase 1's output files. Persons themselves are always processed
//! sequentially — never fanned out against each other — so the batch
//! summary table prints in a stable order.

use async_trait::async_trait;
use biorag_core::status::QuestionStatus;

/// The outcome of running one question for one person.
#[derive(Debug, Clone)]
pub struct PersonQuestionResult {
    pub question_id: String,
    pub status: QuestionStatus,
}

/// One runnable question. Implementations own their own chunk
/// retrieval, extraction, and verification; the orchestrator only
/// schedules and collects.
#[async_trait]
pub trait QuestionJob: Send + Sync {
    fn question_id(&self) -> &str;

    /// Must never panic past this boundary in a way the caller can't
    /// observe — any internal error should be caught and mapped to an
    /// `error`-status [`PersonQuestionResult`]. A genuine panic is still
    /// caught one level up by [`run_person_pipeline`]'s `JoinSet`.
    async fn run(&self) -> PersonQuestionResult;
}

/// Run every RAG question for one person concurrently, then every
/// synthesis question sequentially. A job that panics is reported as an
/// `error` status rather than aborting the rest of the person's run.
pub async fn run_person_pipeline(
    rag_jobs: Vec<Box<dyn QuestionJob>>,
    synthesis_jobs: Vec<Box<dyn QuestionJob>>,
) -> Vec<PersonQuestionResult> {
    let mut results = Vec::with_capacity(rag_jobs.len() + synthesis_jobs.len());

    let mut set = tokio::task::JoinSet::new();
    for job in rag_jobs {
        set.spawn(async move { job.run().await });
    }
    while let Some(outcome) = set.join_next().await {
        match outcome {
            Ok(result) => results.push(result),
            Err(join_error) => {
                tracing::error!(%join_error, "question job panicked");
                results.push(PersonQuestionResult {
                    question_id: "unknown".to_string(),
                    status: QuestionStatus::Error,
                });
            }
        }
    }

    for job in synthesis_jobs {
        results.push(job.run().await);
    }

    results
}

/// Builds the (RAG jobs, synthesis jobs) pair for one person. Callers
/// close over whatever chunk store, providers, and prompt templates the
/// jobs need; the orchestrator itself stays storage-agnostic.
pub trait PersonJobBuilder {
    fn build(&self, person_dir_name: &str) -> (Vec<Box<dyn QuestionJob>>, Vec<Box<dyn QuestionJob>>);
}

/// Run the full pipeline for each person in turn, never overlapping two
/// people's question sets against each other.
pub async fn run_pipeline_for_persons(
    persons: &[String],
    builder: &dyn PersonJobBuilder,
) -> Vec<(String, Vec<PersonQuestionResult>)> {
    let mut all_results = Vec::with_capacity(persons.len());
    for person_dir_name in persons {
        let (rag_jobs, synthesis_jobs) = builder.build(person_dir_name);
        let results = run_person_pipeline(rag_jobs, synthesis_jobs).await;
        all_results.push((person_dir_name.clone(), results));
    }
    all_results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedJob {
        id: &'static str,
        status: QuestionStatus,
    }

    #[async_trait]
    impl QuestionJob for FixedJob {
        fn question_id(&self) -> &str {
            self.id
        }
        async fn run(&self) -> PersonQuestionResult {
            PersonQuestionResult {
                question_id: self.id.to_string(),
                status: self.status,
            }
        }
    }

    struct PanickingJob;

    #[async_trait]
    impl QuestionJob for PanickingJob {
        fn question_id(&self) -> &str {
            "boom"
        }
        async fn run(&self) -> PersonQuestionResult {
            panic!("simulated question failure");
        }
    }

    #[tokio::test]
    async fn phase1_runs_concurrently_phase2_runs_after() {
        let order = Arc::new(AtomicUsize::new(0));

        struct OrderedJob {
            id: &'static str,
            order: Arc<AtomicUsize>,
        }
        #[async_trait]
        impl QuestionJob for OrderedJob {
            fn question_id(&self) -> &str {
                self.id
            }
            async fn run(&self) -> PersonQuestionResult {
                let seq = self.order.fetch_add(1, Ordering::SeqCst);
                PersonQuestionResult {
                    question_id: format!("{}:{}", self.id, seq),
                    status: QuestionStatus::FoundAndVerified,
                }
            }
        }

        let rag: Vec<Box<dyn QuestionJob>> = vec![
            Box::new(OrderedJob { id: "q1", order: order.clone() }),
            Box::new(OrderedJob { id: "q2", order: order.clone() }),
        ];
        let synthesis: Vec<Box<dyn QuestionJob>> =
            vec![Box::new(OrderedJob { id: "q7", order: order.clone() })];

        let results = run_person_pipeline(rag, synthesis).await;
        assert_eq!(results.len(), 3);
        // The synthesis job must have observed a sequence number no lower
        // than either RAG job's, since it only starts after both finish.
        let q7 = results.iter().find(|r| r.question_id.starts_with("q7")).unwrap();
        let q7_seq: usize = q7.question_id.split(':').nth(1).unwrap().parse().unwrap();
        assert_eq!(q7_seq, 2);
    }

    #[tokio::test]
    async fn panicking_job_becomes_error_status_not_aborted_batch() {
        let rag: Vec<Box<dyn QuestionJob>> = vec![
            Box::new(PanickingJob),
            Box::new(FixedJob { id: "q2", status: QuestionStatus::FoundAndVerified }),
        ];
        let results = run_person_pipeline(rag, Vec::new()).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| r.status == QuestionStatus::Error));
        assert!(results
            .iter()
            .any(|r| r.status == QuestionStatus::FoundAndVerified));
    }
}
