//! Turns a [`SearchResponse`] into the prompt context block handed to the
//! field-extraction LLM call, and builds that extraction prompt itself.
//!
//! Grounded on `enrichment.py`'s `_build_context` / `_build_extraction_prompt`:
//! same three-part structure (knowledge graph, answer box, numbered organic
//! results) and the same JSON-schema instruction block.

use biorag_providers::SearchResponse;

/// Recognized `meta_type` values, in priority order for tie-breaking
/// conflicting signals (an `io` mention always outranks a `private` one).
pub const META_TYPE_PRIORITY: [&str; 6] = ["io", "university", "gov", "ngo", "private", "other"];

/// Renders search evidence as a context block for the extraction prompt.
/// Returns an empty string when there is nothing to show, so the caller can
/// skip the LLM call entirely and fall back.
pub fn build_context(response: &SearchResponse) -> String {
    let mut sections = Vec::new();

    if let Some(kg) = &response.knowledge_graph {
        let mut block = format!("[Knowledge Graph]\nTitle: {}\n", kg.title);
        if !kg.entity_type.is_empty() {
            block.push_str(&format!("Type: {}\n", kg.entity_type));
        }
        if !kg.description.is_empty() {
            block.push_str(&format!("Description: {}\n", kg.description));
        }
        if !kg.website.is_empty() {
            block.push_str(&format!("Website: {}\n", kg.website));
        }
        sections.push(block);
    }

    if let Some(answer_box) = &response.answer_box {
        let mut block = String::from("[Answer Box]\n");
        if !answer_box.answer.is_empty() {
            block.push_str(&format!("Answer: {}\n", answer_box.answer));
        }
        if !answer_box.snippet.is_empty() {
            block.push_str(&format!("Snippet: {}\n", answer_box.snippet));
        }
        sections.push(block);
    }

    for (index, result) in response.results.iter().enumerate() {
        sections.push(format!(
            "[Result {} — {}]\nTitle: {}\nSnippet: {}\n",
            index + 1,
            result.domain,
            result.title,
            result.snippet
        ));
    }

    sections.join("\n")
}

/// Builds the full field-extraction prompt for `canonical_name` given a
/// context block already produced by [`build_context`].
pub fn build_extraction_prompt(canonical_name: &str, context: &str) -> String {
    format!(
        r#"You are extracting structured facts about an organization from search results.

Organization (as referenced in source documents): {canonical_name}

Search evidence:
{context}

Using ONLY the evidence above, return a JSON object with these fields:
- canonical_name: the organization's full, official name
- variations_found: array of name variations/abbreviations seen in the evidence
- meta_type: one of "io", "university", "gov", "ngo", "private", "other"
  - io: intergovernmental organization (UN agencies, World Bank, regional development banks)
  - university: degree-granting academic institution
  - gov: a national or subnational government body or ministry
  - ngo: nonprofit, foundation, or civil-society organization
  - private: for-profit company or private-sector entity
  - other: none of the above, or evidence is insufficient to tell
- sector: one short phrase describing the organization's field of work
- location_country: ISO 3166-1 alpha-3 country code, or null if unknown
- location_city: city name, or null if unknown
- suggested_tag: a short hierarchical tag like "io.un.unicef" or "university.us.mit"
- confidence: float between 0.0 and 1.0 reflecting evidence strength
- sources: array of domains that support this proposal
- reasoning: one or two sentences explaining the meta_type and tag choice

Return ONLY valid JSON, no markdown fences, no commentary."#
    )
}
