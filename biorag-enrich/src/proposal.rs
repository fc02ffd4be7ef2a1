//! The enrichment output shape: one [`EnrichmentProposal`] per ontology
//! stub, plus the "give up gracefully" fallback constructor every failure
//! path in [`crate::engine`] routes through.

use biorag_store::OntologyEntry;
use serde::{Deserialize, Serialize};

/// How a proposal's fields were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentMethod {
    /// Full pipeline: web search plus an LLM extraction call.
    SerperLlm,
    /// Search evidence only, no LLM call (`--no-llm`).
    SerperOnly,
    /// Search or LLM step failed; fields carry the stub's own values.
    Fallback,
}

impl EnrichmentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SerperLlm => "serper+llm",
            Self::SerperOnly => "serper_only",
            Self::Fallback => "fallback",
        }
    }
}

/// Proposed field values for a single ontology stub, per spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentProposal {
    pub canonical_name: String,
    #[serde(default)]
    pub variations_found: Vec<String>,
    pub meta_type: String,
    pub sector: String,
    pub location_country: Option<String>,
    pub location_city: Option<String>,
    pub suggested_tag: String,
    pub confidence: f64,
    #[serde(default)]
    pub sources: Vec<String>,
    pub reasoning: String,
    pub enrichment_method: EnrichmentMethod,
}

impl EnrichmentProposal {
    /// A minimal proposal carrying the stub's existing fields forward,
    /// emitted whenever search or LLM extraction fails. Confidence `0.0`
    /// signals the entry still needs a human pass.
    pub fn fallback(stub: &OntologyEntry, reason: impl Into<String>) -> Self {
        Self {
            canonical_name: stub.canonical_name.clone(),
            variations_found: stub.variations_found.clone(),
            meta_type: stub.meta_type.clone(),
            sector: String::new(),
            location_country: None,
            location_city: None,
            suggested_tag: String::new(),
            confidence: 0.0,
            sources: Vec::new(),
            reasoning: reason.into(),
            enrichment_method: EnrichmentMethod::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub() -> OntologyEntry {
        OntologyEntry {
            canonical_name: "World Bank Regional Office".to_string(),
            meta_type: "io".to_string(),
            variations_found: vec!["WBRO".to_string()],
            sector: "intergovernmental".to_string(),
            country: None,
            city: None,
            org_types: vec!["intergovernmental_organization".to_string()],
            hierarchical_tags: vec![],
            canonical_tag: None,
            parent: None,
            source: "auto_stub".to_string(),
            status: "pending_review".to_string(),
        }
    }

    #[test]
    fn fallback_carries_stub_fields_forward() {
        let proposal = EnrichmentProposal::fallback(&stub(), "search failed: timeout");
        assert_eq!(proposal.canonical_name, "World Bank Regional Office");
        assert_eq!(proposal.variations_found, vec!["WBRO".to_string()]);
        assert_eq!(proposal.confidence, 0.0);
        assert_eq!(proposal.enrichment_method, EnrichmentMethod::Fallback);
        assert_eq!(proposal.reasoning, "search failed: timeout");
    }
}
