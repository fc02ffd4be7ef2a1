//! Loads the question manifest and prompt template files out of the
//! prompts directory. Template loading and filesystem concerns are kept
//! here rather than in `biorag-rag`, per that crate's own module
//! documentation.

use std::path::Path;

use biorag_rag::BestAnswerPolicy;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawPolicy {
    FirstFact,
    RichestList,
}

/// One question's manifest entry: what to ask, which templates answer it,
/// and (for synthesis questions) which prior results it reads.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDescriptor {
    pub id: String,
    #[serde(default)]
    pub query: String,
    pub extraction_template: String,
    #[serde(default)]
    pub verification_template: Option<String>,
    #[serde(default = "default_policy")]
    policy: RawPolicy,
    #[serde(default)]
    pub primary_list_field: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Base-record fields that must all be non-null for this question to
    /// run; any null or missing field skips it before retrieval.
    #[serde(default)]
    pub skip_if_null: Vec<String>,
}

fn default_policy() -> RawPolicy {
    RawPolicy::FirstFact
}

impl QuestionDescriptor {
    pub fn best_answer_policy(&self) -> BestAnswerPolicy {
        match (&self.policy, &self.primary_list_field) {
            (RawPolicy::RichestList, Some(field)) => {
                BestAnswerPolicy::RichestList { primary_list_field: field.clone() }
            }
            _ => BestAnswerPolicy::FirstFact,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionManifest {
    pub rag_questions: Vec<QuestionDescriptor>,
    #[serde(default)]
    pub synthesis_questions: Vec<QuestionDescriptor>,
}

/// Load `prompts_dir/questions.json` and every template file it
/// references, returning the manifest plus a lookup from template
/// filename to its contents.
pub async fn load_manifest(
    prompts_dir: &Path,
) -> Result<(QuestionManifest, std::collections::HashMap<String, String>), CliError> {
    let manifest_path = prompts_dir.join("questions.json");
    let body = tokio::fs::read_to_string(&manifest_path)
        .await
        .map_err(|_| CliError::UnreadablePromptsDir(prompts_dir.to_path_buf()))?;
    let manifest: QuestionManifest =
        serde_json::from_str(&body).map_err(|source| CliError::Json { path: manifest_path, source })?;

    let mut templates = std::collections::HashMap::new();
    for descriptor in manifest.rag_questions.iter().chain(manifest.synthesis_questions.iter()) {
        load_template(prompts_dir, &descriptor.extraction_template, &mut templates).await?;
        if let Some(verification_template) = &descriptor.verification_template {
            load_template(prompts_dir, verification_template, &mut templates).await?;
        }
    }

    Ok((manifest, templates))
}

async fn load_template(
    prompts_dir: &Path,
    file_name: &str,
    templates: &mut std::collections::HashMap<String, String>,
) -> Result<(), CliError> {
    if templates.contains_key(file_name) {
        return Ok(());
    }
    let path = prompts_dir.join(file_name);
    let body = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| CliError::Io { path, source })?;
    templates.insert(file_name.to_string(), body);
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_descriptor(id: &str) -> QuestionDescriptor {
    QuestionDescriptor {
        id: id.to_string(),
        query: String::new(),
        extraction_template: String::new(),
        verification_template: None,
        policy: RawPolicy::FirstFact,
        primary_list_field: None,
        depends_on: Vec::new(),
        skip_if_null: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_manifest_and_referenced_templates() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("questions.json"),
            serde_json::json!({
                "rag_questions": [{
                    "id": "nationality",
                    "query": "What is their nationality?",
                    "extraction_template": "nationality_extract.txt",
                    "verification_template": "nationality_verify.txt"
                }],
                "synthesis_questions": []
            })
            .to_string(),
        )
        .await
        .unwrap();
        tokio::fs::write(dir.path().join("nationality_extract.txt"), "extract {{CHUNK_TEXT}}").await.unwrap();
        tokio::fs::write(dir.path().join("nationality_verify.txt"), "verify {{CHUNK_TEXT}}").await.unwrap();

        let (manifest, templates) = load_manifest(dir.path()).await.unwrap();
        assert_eq!(manifest.rag_questions.len(), 1);
        assert_eq!(templates.len(), 2);
    }

    #[tokio::test]
    async fn missing_manifest_is_unreadable_prompts_dir_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_manifest(dir.path()).await;
        assert!(matches!(result, Err(CliError::UnreadablePromptsDir(_))));
    }
}
