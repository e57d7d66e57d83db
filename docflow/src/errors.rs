//! Error taxonomy for docflow runs.
//!
//! Three layers: [`GenerationError`] for the external generation capability,
//! [`StageError`] for stage handlers, and [`DocflowError`] for the terminal
//! outcome of a run. None of them is recoverable within a run; the caller
//! decides whether to retry an entire run.

use crate::stages::StageName;
use thiserror::Error;

/// Error raised by the external generation capability.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The provider call failed (network, HTTP, or API error).
    #[error("Provider error: {detail}")]
    Provider {
        /// Human-readable failure detail.
        detail: String,
        /// Whether the provider considers the failure transient.
        retryable: bool,
    },

    /// The provider responded, but the content could not be interpreted.
    #[error("Malformed generation response: {detail}")]
    MalformedResponse {
        /// What was wrong with the response.
        detail: String,
    },

    /// A required credential is missing from the environment.
    #[error("Missing credential: {name}")]
    MissingCredentials {
        /// The environment variable that was not set.
        name: String,
    },
}

impl GenerationError {
    /// Creates a provider error.
    #[must_use]
    pub fn provider(detail: impl Into<String>, retryable: bool) -> Self {
        Self::Provider {
            detail: detail.into(),
            retryable,
        }
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }

    /// Creates a missing-credentials error.
    #[must_use]
    pub fn missing_credentials(name: impl Into<String>) -> Self {
        Self::MissingCredentials { name: name.into() }
    }

    /// Returns true if retrying the external call might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { retryable: true, .. })
    }
}

/// Error raised by a stage handler.
#[derive(Debug, Error)]
pub enum StageError {
    /// The context was malformed for this stage.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The generation capability failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// The terminal error type for a pipeline run.
#[derive(Debug, Error)]
pub enum DocflowError {
    /// Malformed input detected at the Manager stage.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The generation capability failed while a stage was running.
    #[error("Generation failed at stage '{stage}': {source}")]
    Generation {
        /// The stage whose handler observed the failure.
        stage: StageName,
        /// The underlying generation error.
        source: GenerationError,
    },

    /// The Review/Validation loop was exhausted without a passing score.
    #[error("Retry bound exceeded after {cycles} review cycles")]
    RetryBoundExceeded {
        /// Review cycles completed before giving up.
        cycles: u32,
    },

    /// The run was cancelled between stage boundaries.
    #[error("Run cancelled: {0}")]
    Cancelled(String),

    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocflowError {
    /// Returns the failing stage for generation errors, if any.
    #[must_use]
    pub fn failing_stage(&self) -> Option<StageName> {
        match self {
            Self::Generation { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Error raised when assembling a pipeline from incomplete configuration.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineBuildError {
    /// The error message.
    pub message: String,
}

impl PipelineBuildError {
    /// Creates a new build error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
