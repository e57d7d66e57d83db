//! Validation scoring outcome.

use serde::{Deserialize, Serialize};

/// Result of scoring a draft answer against the source text.
///
/// Scores are integers in `0..=100`; out-of-range values are clamped at
/// construction. The outcome is not persisted beyond the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Score in `0..=100`.
    pub score: u8,
    /// Free-text feedback from the scorer.
    pub feedback: String,
}

impl ValidationOutcome {
    /// Creates a new outcome, clamping the score to 100.
    #[must_use]
    pub fn new(score: u8, feedback: impl Into<String>) -> Self {
        Self {
            score: score.min(100),
            feedback: feedback.into(),
        }
    }

    /// Returns true if the score meets the given threshold.
    #[must_use]
    pub fn passes(&self, threshold: u8) -> bool {
        self.score >= threshold
    }
}
