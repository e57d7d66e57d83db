//! Successful terminal stage.

use super::{StageHandler, StageName, StageResult};
use crate::context::{ContextPatch, DocumentContext};
use crate::errors::StageError;
use async_trait::async_trait;

/// Promotes the accepted draft to the final answer.
///
/// Mechanical by design: the draft already passed validation, so no further
/// generation work is warranted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionStage;

impl CompletionStage {
    /// Creates the completion stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StageHandler for CompletionStage {
    fn stage(&self) -> StageName {
        StageName::Completion
    }

    async fn run(&self, ctx: &DocumentContext) -> Result<StageResult, StageError> {
        let Some(draft) = ctx.draft_answer.as_deref() else {
            return Err(StageError::InvalidInput(
                "no draft answer to finalize".to_string(),
            ));
        };

        Ok(StageResult::terminate(
            ContextPatch::new()
                .with_final_answer(draft)
                .with_note("processing completed"),
        ))
    }
}
