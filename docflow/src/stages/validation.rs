//! Draft scoring stage.

use super::{StageHandler, StageName, StageResult};
use crate::context::{ContextPatch, DocumentContext, ValidationOutcome};
use crate::errors::{GenerationError, StageError};
use crate::generation::{GenerationRequest, Generator};
use crate::prompts;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static SCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)\bscore\b\s*[:=]?\s*(\d{1,3})").expect("score pattern"));

static FEEDBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\bfeedback\b\s*[:=]\s*(.+)").expect("feedback pattern"));

/// Scores the draft answer against the source text.
///
/// The generator is instructed to reply with `Score:` and `Feedback:` lines;
/// a reply with no recognizable score is a malformed response, not a zero.
#[derive(Debug)]
pub struct ValidationStage {
    generator: Arc<dyn Generator>,
    threshold: u8,
}

impl ValidationStage {
    /// Creates the stage around a generator with the given pass mark.
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, threshold: u8) -> Self {
        Self {
            generator,
            threshold: threshold.min(100),
        }
    }

    /// Parses a scoring reply into an outcome.
    fn parse_outcome(content: &str) -> Result<ValidationOutcome, GenerationError> {
        let score = SCORE_RE
            .captures(content)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .ok_or_else(|| {
                GenerationError::malformed("validation reply carried no score line")
            })?;

        let feedback = FEEDBACK_RE
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let clamped = u8::try_from(score.min(100)).unwrap_or(100);
        Ok(ValidationOutcome::new(clamped, feedback))
    }
}

#[async_trait]
impl StageHandler for ValidationStage {
    fn stage(&self) -> StageName {
        StageName::Validation
    }

    async fn run(&self, ctx: &DocumentContext) -> Result<StageResult, StageError> {
        let reply = self
            .generator
            .generate(GenerationRequest::new(
                StageName::Validation,
                prompts::VALIDATION_INSTRUCTION,
                prompts::validation_input(ctx),
            ))
            .await?;

        let outcome = Self::parse_outcome(&reply.content)?;
        let next = if outcome.passes(self.threshold) {
            StageName::Completion
        } else {
            StageName::Review
        };

        Ok(StageResult::advance(
            ContextPatch::new()
                .with_note(format!("draft scored {}", outcome.score))
                .with_validation(outcome),
            next,
        ))
    }
}
