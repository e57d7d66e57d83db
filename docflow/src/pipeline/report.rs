//! The invocation boundary: request, report, and failure types.
//!
//! The same contract serves a CLI front end and a request/response adapter;
//! both are thin layers over [`DocumentPipeline`](super::DocumentPipeline).

use super::PipelineRun;
use crate::context::DocumentContext;
use crate::errors::DocflowError;
use crate::stages::StageName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Input to a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    /// Raw text of the source document.
    pub source_text: String,
    /// The user's question.
    pub prompt: String,
    /// Optional key/value context for the run.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_context: HashMap<String, String>,
}

impl DocumentRequest {
    /// Creates a request from document text and a prompt.
    #[must_use]
    pub fn new(source_text: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            prompt: prompt.into(),
            additional_context: HashMap::new(),
        }
    }

    /// Sets additional context.
    #[must_use]
    pub fn with_additional_context(mut self, context: HashMap<String, String>) -> Self {
        self.additional_context = context;
        self
    }

    /// Converts the request into a fresh run context.
    #[must_use]
    pub fn into_context(self) -> DocumentContext {
        DocumentContext::new(self.source_text, self.prompt)
            .with_additional_context(self.additional_context)
    }
}

/// Successful run output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// The accepted answer.
    pub final_answer: String,
    /// Ordered sequence of stages visited.
    pub history: Vec<StageName>,
    /// Final validation score.
    pub score: u8,
    /// Run metadata.
    pub summary: RunSummary,
}

impl RunReport {
    /// Builds a report from a completed run.
    #[must_use]
    pub fn from_run(run: PipelineRun) -> Self {
        let duration_ms = run.duration_ms();
        let PipelineRun {
            run_id,
            context,
            review_cycles,
            started_at,
            finished_at,
        } = run;

        Self {
            final_answer: context.final_answer.unwrap_or_default(),
            score: context.validation.as_ref().map_or(0, |v| v.score),
            summary: RunSummary {
                run_id,
                stages_visited: context.history.len(),
                review_cycles,
                notes: context.notes,
                started_at,
                finished_at,
                duration_ms,
            },
            history: context.history,
        }
    }
}

/// Run metadata attached to a [`RunReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of the run.
    pub run_id: Uuid,
    /// Number of stages visited, terminal included.
    pub stages_visited: usize,
    /// Review cycles consumed.
    pub review_cycles: u32,
    /// Ordered stage notes.
    pub notes: Vec<String>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

/// Terminal error result of a run.
///
/// Carries the partial history and last known context for diagnostics;
/// callers wanting the best-effort draft can read
/// `failure.context.draft_answer`.
#[derive(Debug)]
pub struct RunFailure {
    /// What went wrong.
    pub error: DocflowError,
    /// The last stage that ran (the failing one, for stage failures).
    pub last_stage: Option<StageName>,
    /// The context as it stood when the run stopped.
    pub context: DocumentContext,
}

impl RunFailure {
    /// Creates a new failure.
    #[must_use]
    pub fn new(
        error: DocflowError,
        last_stage: Option<StageName>,
        context: DocumentContext,
    ) -> Self {
        Self {
            error,
            last_stage,
            context,
        }
    }
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.last_stage {
            Some(stage) => write!(f, "run failed at stage '{stage}': {}", self.error),
            None => write!(f, "run failed before any stage: {}", self.error),
        }
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
