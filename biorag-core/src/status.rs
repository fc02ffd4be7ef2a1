//! The extraction/verification status enum and confidence bands shared by
//! the Question Runner, Enrichment Engine, and CLI reporting.

use serde::{Deserialize, Serialize};

/// Terminal status of a single (person, question) run.
///
/// Priority order when more than one condition applies (highest wins):
/// `Error` > `Skipped` > `NoChunksRetrieved` > `CannotDetermine` >
/// `FoundAndVerified` > `FoundNoConfirmingSources`.
///
/// `Found` is reserved for a future bare "extracted, verification not
/// attempted" state and is never produced by the current pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Error,
    Skipped,
    NoChunksRetrieved,
    CannotDetermine,
    FoundAndVerified,
    FoundNoConfirmingSources,
    /// Reserved; not currently produced.
    Found,
}

impl QuestionStatus {
    /// Resolve the final status from the extraction/verification pass
    /// outcomes, following the original priority order exactly.
    pub fn determine(
        error: bool,
        skipped: bool,
        chunks_retrieved: usize,
        best_extraction_found: bool,
        confirmation_count: usize,
    ) -> Self {
        if error {
            return Self::Error;
        }
        if skipped {
            return Self::Skipped;
        }
        if chunks_retrieved == 0 {
            return Self::NoChunksRetrieved;
        }
        if !best_extraction_found {
            return Self::CannotDetermine;
        }
        if confirmation_count >= 1 {
            return Self::FoundAndVerified;
        }
        Self::FoundNoConfirmingSources
    }
}

/// A qualitative confidence band, used for both extraction confidence
/// (`"high"`/`"medium"`/`"low"`) and enrichment confidence scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Mid,
    Low,
    Fail,
}

impl Confidence {
    /// Bucket a numeric confidence score (`0.0..=1.0`) using the same
    /// thresholds the enrichment summary report uses: high >= 0.80,
    /// mid >= 0.55, else low.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.80 {
            Self::High
        } else if score >= 0.55 {
            Self::Mid
        } else {
            Self::Low
        }
    }

    /// Single-character marker used in enrichment progress output.
    pub fn marker(self) -> char {
        match self {
            Self::High => 'H',
            Self::Mid => 'M',
            Self::Low => 'L',
            Self::Fail => 'F',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_takes_priority_over_everything() {
        assert_eq!(
            QuestionStatus::determine(true, true, 0, false, 0),
            QuestionStatus::Error
        );
    }

    #[test]
    fn no_chunks_before_cannot_determine() {
        assert_eq!(
            QuestionStatus::determine(false, false, 0, false, 0),
            QuestionStatus::NoChunksRetrieved
        );
    }

    #[test]
    fn found_and_verified_requires_confirmation() {
        assert_eq!(
            QuestionStatus::determine(false, false, 5, true, 1),
            QuestionStatus::FoundAndVerified
        );
        assert_eq!(
            QuestionStatus::determine(false, false, 5, true, 0),
            QuestionStatus::FoundNoConfirmingSources
        );
    }

    #[test]
    fn confidence_bands_match_thresholds() {
        assert_eq!(Confidence::from_score(0.81), Confidence::High);
        assert_eq!(Confidence::from_score(0.80), Confidence::High);
        assert_eq!(Confidence::from_score(0.79), Confidence::Mid);
        assert_eq!(Confidence::from_score(0.55), Confidence::Mid);
        assert_eq!(Confidence::from_score(0.1), Confidence::Low);
    }
}
