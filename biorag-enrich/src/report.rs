//! Post-run summary: confidence-bucket counts, parent-org proposals, and
//! meta-type corrections, formatted for terminal output.
//!
//! Grounded on `batch_enrich_full.py`'s `_print_summary`.

use crate::proposal::{EnrichmentMethod, EnrichmentProposal};
use crate::run_file::RunFile;

const HIGH_THRESHOLD: f64 = 0.80;
const MID_THRESHOLD: f64 = 0.55;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub high_confidence: usize,
    pub mid_confidence: usize,
    pub low_confidence: usize,
    pub failed: usize,
    pub meta_type_corrections: Vec<(String, String, String)>,
}

/// Buckets every proposal in `run_file` by confidence and flags any whose
/// `meta_type` disagrees with the stub it started from.
pub fn summarize(run_file: &RunFile, original_meta_types: &[(String, String)]) -> BatchSummary {
    let mut summary = BatchSummary { total: run_file.results.len(), ..Default::default() };

    for (name, proposal) in &run_file.results {
        if proposal.enrichment_method == EnrichmentMethod::Fallback {
            summary.failed += 1;
            continue;
        }
        bucket_confidence(&mut summary, proposal);

        if let Some((_, original_type)) = original_meta_types.iter().find(|(n, _)| n == name) {
            if *original_type != proposal.meta_type {
                summary.meta_type_corrections.push((
                    name.clone(),
                    original_type.clone(),
                    proposal.meta_type.clone(),
                ));
            }
        }
    }

    summary
}

fn bucket_confidence(summary: &mut BatchSummary, proposal: &EnrichmentProposal) {
    if proposal.confidence >= HIGH_THRESHOLD {
        summary.high_confidence += 1;
    } else if proposal.confidence >= MID_THRESHOLD {
        summary.mid_confidence += 1;
    } else {
        summary.low_confidence += 1;
    }
}

/// Renders a [`BatchSummary`] as the multi-line report printed at the end
/// of a batch run.
pub fn format_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Processed {} stub(s)\n", summary.total));
    out.push_str(&format!("  high confidence (>= {HIGH_THRESHOLD:.2}): {}\n", summary.high_confidence));
    out.push_str(&format!("  mid confidence  (>= {MID_THRESHOLD:.2}): {}\n", summary.mid_confidence));
    out.push_str(&format!("  low confidence:                 {}\n", summary.low_confidence));
    out.push_str(&format!("  failed (fallback):              {}\n", summary.failed));

    if !summary.meta_type_corrections.is_empty() {
        out.push_str("\nmeta_type corrections:\n");
        for (name, from, to) in &summary.meta_type_corrections {
            out.push_str(&format!("  {name}: {from} -> {to}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_file::RunArgs;
    use std::path::PathBuf;

    fn proposal(confidence: f64, method: EnrichmentMethod, meta_type: &str) -> EnrichmentProposal {
        EnrichmentProposal {
            canonical_name: "Acme".to_string(),
            variations_found: vec![],
            meta_type: meta_type.to_string(),
            sector: String::new(),
            location_country: None,
            location_city: None,
            suggested_tag: String::new(),
            confidence,
            sources: vec![],
            reasoning: String::new(),
            enrichment_method: method,
        }
    }

    fn run_file_with(results: Vec<(&str, EnrichmentProposal)>) -> RunFile {
        let mut run_file = RunFile::new(PathBuf::from("out.json"), "run".to_string(), RunArgs::default(), results.len());
        for (name, proposal) in results {
            run_file.results.insert(name.to_string(), proposal);
        }
        run_file
    }

    #[test]
    fn buckets_by_confidence_threshold() {
        let run_file = run_file_with(vec![
            ("a", proposal(0.9, EnrichmentMethod::SerperLlm, "ngo")),
            ("b", proposal(0.6, EnrichmentMethod::SerperLlm, "ngo")),
            ("c", proposal(0.1, EnrichmentMethod::SerperLlm, "ngo")),
            ("d", proposal(0.0, EnrichmentMethod::Fallback, "other")),
        ]);
        let summary = summarize(&run_file, &[]);
        assert_eq!(summary.high_confidence, 1);
        assert_eq!(summary.mid_confidence, 1);
        assert_eq!(summary.low_confidence, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn flags_meta_type_corrections() {
        let run_file = run_file_with(vec![("Acme", proposal(0.9, EnrichmentMethod::SerperLlm, "ngo"))]);
        let summary = summarize(&run_file, &[("Acme".to_string(), "other".to_string())]);
        assert_eq!(summary.meta_type_corrections, vec![("Acme".to_string(), "other".to_string(), "ngo".to_string())]);
    }

    #[test]
    fn format_summary_includes_counts() {
        let summary = BatchSummary { total: 3, high_confidence: 1, mid_confidence: 1, low_confidence: 1, failed: 0, meta_type_corrections: vec![] };
        let text = format_summary(&summary);
        assert!(text.contains("Processed 3 stub(s)"));
    }
}
