//! Draft revision stage.

use super::{StageHandler, StageName, StageResult};
use crate::context::{ContextPatch, DocumentContext};
use crate::errors::{GenerationError, StageError};
use crate::generation::{GenerationRequest, Generator};
use crate::prompts;
use async_trait::async_trait;
use std::sync::Arc;

/// Rewrites a draft that failed validation, applying the scorer's feedback.
///
/// Always routes back to Validation; only the controller may decide the
/// loop has gone on long enough.
#[derive(Debug)]
pub struct ReviewStage {
    generator: Arc<dyn Generator>,
}

impl ReviewStage {
    /// Creates the stage around a generator.
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StageHandler for ReviewStage {
    fn stage(&self) -> StageName {
        StageName::Review
    }

    async fn run(&self, ctx: &DocumentContext) -> Result<StageResult, StageError> {
        let reply = self
            .generator
            .generate(GenerationRequest::new(
                StageName::Review,
                prompts::REVIEW_INSTRUCTION,
                prompts::review_input(ctx),
            ))
            .await?;

        let revised = reply.content.trim();
        if revised.is_empty() {
            return Err(GenerationError::malformed("review produced no revision").into());
        }

        Ok(StageResult::advance(
            ContextPatch::new()
                .with_draft_answer(revised)
                .with_note("draft revised from validation feedback"),
            StageName::Validation,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ValidationOutcome;
    use crate::stages::Transition;
    use crate::testing::ScriptedGenerator;

    #[tokio::test]
    async fn test_review_replaces_draft_and_returns_to_validation() {
        let generator = ScriptedGenerator::new().with_reply(StageName::Review, "a better draft");
        let stage = ReviewStage::new(Arc::new(generator));

        let mut ctx = DocumentContext::new("doc", "question");
        ctx.apply(
            ContextPatch::new()
                .with_draft_answer("weak draft")
                .with_validation(ValidationOutcome::new(40, "cite the source")),
        );

        let result = stage.run(&ctx).await.unwrap();
        assert_eq!(result.patch.draft_answer.as_deref(), Some("a better draft"));
        assert_eq!(result.next, Transition::To(StageName::Validation));
    }
}
