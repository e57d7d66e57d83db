//! Run configuration.

use serde::{Deserialize, Serialize};

/// Default validation pass mark.
pub const DEFAULT_SCORE_THRESHOLD: u8 = 70;

/// Configuration for the stage controller.
///
/// There is deliberately no `Default` implementation: the review-cycle bound
/// has no sensible universal value, so callers must choose one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum Review/Validation cycles before the run is failed.
    pub max_review_cycles: u32,
    /// Validation pass mark in `0..=100`.
    pub score_threshold: u8,
}

impl PipelineConfig {
    /// Creates a config with the required review-cycle bound and the
    /// default score threshold.
    #[must_use]
    pub fn new(max_review_cycles: u32) -> Self {
        Self {
            max_review_cycles,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }

    /// Sets the score threshold, clamped to 100.
    #[must_use]
    pub fn with_score_threshold(mut self, threshold: u8) -> Self {
        self.score_threshold = threshold.min(100);
        self
    }
}
