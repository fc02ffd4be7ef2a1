//! [`QuestionJob`] implementations: one for RAG questions (retrieval,
//! extraction, verification), one for synthesis questions (reads prior
//! results, no retrieval or verification). Both write their outcome to the
//! Result Store before reporting a status back to the orchestrator.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use biorag_core::status::QuestionStatus;
use biorag_core::PersonName;
use biorag_providers::{ChatLlm, ChatRequest, EmbeddingProvider, Reranker};
use biorag_rag::question_runner::{
    determine_status, fill_template, run_extraction_pass, run_verification_pass,
};
use biorag_rag::ranker::retrieve_for_person;
use biorag_rag::{
    ExtractionConfig, PersonQuestionResult, QuestionContext, QuestionJob, RankerConfig,
    VerificationConfig,
};
use biorag_store::{ChunkStore, ResultStore};

use crate::base_record::PersonBaseRecord;
use crate::questions::QuestionDescriptor;

/// `true` if any of `descriptor`'s required fields is null or missing in
/// `base_record` — mirrors the original's `should_skip`.
fn should_skip(descriptor: &QuestionDescriptor, base_record: &PersonBaseRecord) -> bool {
    descriptor
        .skip_if_null
        .iter()
        .any(|field| base_record.field_is_null(field))
}

/// Fill the single-brace `{PERSON_NAME}`/`{NOMINATION_YEAR}` placeholders
/// the retrieval query template uses — distinct from `fill_template`'s
/// double-brace convention used by the extraction/verification prompts.
fn fill_query(query: &str, context: &QuestionContext) -> String {
    query
        .replace("{PERSON_NAME}", &context.person_name)
        .replace("{NOMINATION_YEAR}", &context.nomination_year)
}

/// Full retrieve → extract → verify pass for one RAG question.
pub struct RagQuestionJob {
    pub person: PersonName,
    pub descriptor: QuestionDescriptor,
    pub extraction_template: String,
    pub verification_template: Option<String>,
    pub context: QuestionContext,
    pub base_record: PersonBaseRecord,
    pub store: Arc<dyn ChunkStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub reranker: Arc<dyn Reranker>,
    pub chat: Arc<dyn ChatLlm>,
    pub results: ResultStore,
}

impl RagQuestionJob {
    async fn run_inner(&self) -> anyhow::Result<QuestionStatus> {
        if should_skip(&self.descriptor, &self.base_record) {
            let status = QuestionStatus::Skipped;
            let output = serde_json::json!({
                "question_id": self.descriptor.id,
                "status": status,
                "answer": serde_json::Value::Null,
                "chunks_scanned": 0,
                "confirmation_count": 0,
            });
            self.results.write(&self.person, &self.descriptor.id, &output).await?;
            return Ok(status);
        }

        let query = fill_query(&self.descriptor.query, &self.context);
        let ranked = retrieve_for_person(
            self.store.as_ref(),
            self.embedder.as_ref(),
            self.reranker.as_ref(),
            self.person.db_name(),
            &query,
            &RankerConfig::default(),
        )
        .await?;
        let chunks_retrieved = ranked.len();

        let extraction_config = ExtractionConfig {
            policy: self.descriptor.best_answer_policy(),
            ..ExtractionConfig::default()
        };
        let extraction = run_extraction_pass(
            self.chat.as_ref(),
            &ranked,
            &self.extraction_template,
            &self.context,
            &extraction_config,
        )
        .await;

        let mut confirmation_count = 0usize;
        if let (Some(best), Some(verification_template)) =
            (&extraction.best, &self.verification_template)
        {
            let used_chunk_ids: HashSet<i64> =
                extraction.trace.iter().map(|t| t.chunk_id).collect();
            let primary_domain = extraction
                .trace
                .iter()
                .find(|t| !t.cannot_determine)
                .map(|t| t.domain.clone());

            let verification = run_verification_pass(
                self.chat.as_ref(),
                &ranked,
                verification_template,
                &self.context,
                best,
                &used_chunk_ids,
                primary_domain.as_deref(),
                &VerificationConfig::default(),
            )
            .await;
            confirmation_count = verification.confirmation_count;
        }

        let status =
            determine_status(false, false, chunks_retrieved, &extraction.best, confirmation_count);

        let output = serde_json::json!({
            "question_id": self.descriptor.id,
            "status": status,
            "answer": extraction.best,
            "chunks_scanned": extraction.chunks_scanned,
            "confirmation_count": confirmation_count,
        });
        self.results.write(&self.person, &self.descriptor.id, &output).await?;

        Ok(status)
    }
}

#[async_trait]
impl QuestionJob for RagQuestionJob {
    fn question_id(&self) -> &str {
        &self.descriptor.id
    }

    async fn run(&self) -> PersonQuestionResult {
        match self.run_inner().await {
            Ok(status) => PersonQuestionResult { question_id: self.descriptor.id.clone(), status },
            Err(error) => {
                tracing::error!(question_id = %self.descriptor.id, %error, "rag question job failed");
                PersonQuestionResult {
                    question_id: self.descriptor.id.clone(),
                    status: QuestionStatus::Error,
                }
            }
        }
    }
}

/// Single chat call over prior questions' results, no retrieval or
/// verification — phase 2 of the pipeline orchestrator.
pub struct SynthesisQuestionJob {
    pub person: PersonName,
    pub descriptor: QuestionDescriptor,
    pub extraction_template: String,
    pub context: QuestionContext,
    pub base_record: PersonBaseRecord,
    pub chat: Arc<dyn ChatLlm>,
    pub results: ResultStore,
}

impl SynthesisQuestionJob {
    async fn run_inner(&self) -> anyhow::Result<QuestionStatus> {
        if should_skip(&self.descriptor, &self.base_record) {
            let status = QuestionStatus::Skipped;
            let output = serde_json::json!({
                "question_id": self.descriptor.id,
                "status": status,
                "answer": serde_json::Value::Null,
            });
            self.results.write(&self.person, &self.descriptor.id, &output).await?;
            return Ok(status);
        }

        let mut prior = serde_json::Map::new();
        for dep_id in &self.descriptor.depends_on {
            let value: Option<serde_json::Value> = self.results.read(&self.person, dep_id).await?;
            let Some(value) = value else {
                let status = QuestionStatus::Skipped;
                let output = serde_json::json!({
                    "question_id": self.descriptor.id,
                    "status": status,
                    "answer": serde_json::Value::Null,
                });
                self.results.write(&self.person, &self.descriptor.id, &output).await?;
                return Ok(status);
            };
            prior.insert(dep_id.clone(), value);
        }
        let prior_results_json =
            serde_json::to_string_pretty(&serde_json::Value::Object(prior)).unwrap_or_default();

        let prompt = fill_template(
            &self.extraction_template,
            &[
                ("PERSON_NAME", &self.context.person_name),
                ("HLP_NAME", &self.context.hlp_name),
                ("NOMINATION_YEAR", &self.context.nomination_year),
                ("NOMINATION_AGE", &self.context.nomination_age),
                ("PRIOR_RESULTS", &prior_results_json),
            ],
        );

        let (best, error) = match self.chat.complete(ChatRequest::new(prompt)).await {
            Ok(response) => (response.parsed, false),
            Err(err) => {
                tracing::warn!(%err, question_id = %self.descriptor.id, "synthesis chat call failed");
                (None, true)
            }
        };

        let confirmation_count = usize::from(best.is_some());
        let chunks_retrieved = self.descriptor.depends_on.len().max(1);
        let status = determine_status(error, false, chunks_retrieved, &best, confirmation_count);

        let output = serde_json::json!({
            "question_id": self.descriptor.id,
            "status": status,
            "answer": best,
        });
        self.results.write(&self.person, &self.descriptor.id, &output).await?;

        Ok(status)
    }
}

#[async_trait]
impl QuestionJob for SynthesisQuestionJob {
    fn question_id(&self) -> &str {
        &self.descriptor.id
    }

    async fn run(&self) -> PersonQuestionResult {
        match self.run_inner().await {
            Ok(status) => PersonQuestionResult { question_id: self.descriptor.id.clone(), status },
            Err(error) => {
                tracing::error!(question_id = %self.descriptor.id, %error, "synthesis question job failed");
                PersonQuestionResult {
                    question_id: self.descriptor.id.clone(),
                    status: QuestionStatus::Error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use biorag_providers::mock::{MockChat, MockEmbedder, MockReranker};
    use biorag_store::{Chunk, StoreError};

    struct FixedChunkStore(Vec<Chunk>);

    #[async_trait]
    impl ChunkStore for FixedChunkStore {
        async fn chunks_for_person(&self, _person_name: &str) -> Result<Vec<Chunk>, StoreError> {
            Ok(self.0.clone())
        }
        async fn count(&self) -> Result<i64, StoreError> {
            Ok(self.0.len() as i64)
        }
    }

    fn chunk(id: i64) -> Chunk {
        Chunk {
            chunk_id: id,
            text: format!("chunk text {id} about Ada Lovelace"),
            chunk_index: 0,
            token_count: 10,
            source_id: id,
            url: "https://example.org/page".to_string(),
            title: "title".to_string(),
            rank: 1,
            embedding: vec![1.0, 0.0],
            embedding_model: "test".to_string(),
        }
    }

    fn descriptor(id: &str) -> QuestionDescriptor {
        crate::questions::test_descriptor(id)
    }

    #[tokio::test]
    async fn rag_job_writes_result_and_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultStore::new(dir.path());
        let person = PersonName::from_db_name("Ada Lovelace");

        let chat = MockChat::new();
        chat.respond_when("chunk text", r#"{"nationality": "British", "confidence": "high"}"#);

        let job = RagQuestionJob {
            person: person.clone(),
            descriptor: descriptor("nationality"),
            extraction_template: "Extract from {{CHUNK_TEXT}}".to_string(),
            verification_template: None,
            context: QuestionContext { person_name: "Ada Lovelace".to_string(), ..Default::default() },
            base_record: PersonBaseRecord {
                person_name: "Ada Lovelace".to_string(),
                ..Default::default()
            },
            store: Arc::new(FixedChunkStore(vec![chunk(1)])),
            embedder: Arc::new(MockEmbedder::new(4)),
            reranker: Arc::new(MockReranker),
            chat: Arc::new(chat),
            results,
        };

        let result = job.run().await;
        assert_eq!(result.status, QuestionStatus::FoundNoConfirmingSources);

        let stored: serde_json::Value = job
            .results
            .read(&person, "nationality")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["answer"]["nationality"], "British");
    }

    #[tokio::test]
    async fn synthesis_job_reads_dependencies_and_writes_result() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultStore::new(dir.path());
        let person = PersonName::from_db_name("Ada Lovelace");

        results
            .write(&person, "nationality", &serde_json::json!({"nationality": "British"}))
            .await
            .unwrap();

        let chat = MockChat::new();
        chat.respond_when("nationality", r#"{"summary": "British mathematician"}"#);

        let mut desc = descriptor("summary");
        desc.depends_on = vec!["nationality".to_string()];

        let job = SynthesisQuestionJob {
            person: person.clone(),
            descriptor: desc,
            extraction_template: "Synthesize from {{PRIOR_RESULTS}}".to_string(),
            context: QuestionContext { person_name: "Ada Lovelace".to_string(), ..Default::default() },
            base_record: PersonBaseRecord {
                person_name: "Ada Lovelace".to_string(),
                ..Default::default()
            },
            chat: Arc::new(chat),
            results,
        };

        let result = job.run().await;
        assert_eq!(result.status, QuestionStatus::FoundAndVerified);
    }

    #[tokio::test]
    async fn rag_job_skips_when_required_field_is_null() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultStore::new(dir.path());
        let person = PersonName::from_db_name("Ada Lovelace");

        let mut desc = descriptor("nationality");
        desc.skip_if_null = vec!["birth_year".to_string()];

        let job = RagQuestionJob {
            person: person.clone(),
            descriptor: desc,
            extraction_template: "Extract from {{CHUNK_TEXT}}".to_string(),
            verification_template: None,
            context: QuestionContext { person_name: "Ada Lovelace".to_string(), ..Default::default() },
            base_record: PersonBaseRecord {
                person_name: "Ada Lovelace".to_string(),
                birth_year: None,
                ..Default::default()
            },
            store: Arc::new(FixedChunkStore(vec![chunk(1)])),
            embedder: Arc::new(MockEmbedder::new(4)),
            reranker: Arc::new(MockReranker),
            chat: Arc::new(MockChat::new()),
            results,
        };

        let result = job.run().await;
        assert_eq!(result.status, QuestionStatus::Skipped);

        let stored: serde_json::Value = job
            .results
            .read(&person, "nationality")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["status"], "skipped");
    }

    #[tokio::test]
    async fn synthesis_job_skips_when_dependency_missing() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultStore::new(dir.path());
        let person = PersonName::from_db_name("Ada Lovelace");

        let chat = MockChat::new();
        chat.respond_when("nationality", r#"{"summary": "British mathematician"}"#);

        let mut desc = descriptor("summary");
        desc.depends_on = vec!["nationality".to_string()];

        let job = SynthesisQuestionJob {
            person: person.clone(),
            descriptor: desc,
            extraction_template: "Synthesize from {{PRIOR_RESULTS}}".to_string(),
            context: QuestionContext { person_name: "Ada Lovelace".to_string(), ..Default::default() },
            base_record: PersonBaseRecord {
                person_name: "Ada Lovelace".to_string(),
                ..Default::default()
            },
            chat: Arc::new(chat),
            results,
        };

        let result = job.run().await;
        assert_eq!(result.status, QuestionStatus::Skipped);
    }
}
