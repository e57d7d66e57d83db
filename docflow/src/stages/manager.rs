//! Entry stage: validates the incoming context.

use super::{StageHandler, StageName, StageResult};
use crate::context::{ContextPatch, DocumentContext};
use crate::errors::StageError;
use async_trait::async_trait;

/// Validates the incoming context before any generation work happens.
///
/// The only stage that makes no generation call: a run with no document or
/// no question fails here, cheaply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerStage;

impl ManagerStage {
    /// Creates the manager stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StageHandler for ManagerStage {
    fn stage(&self) -> StageName {
        StageName::Manager
    }

    async fn run(&self, ctx: &DocumentContext) -> Result<StageResult, StageError> {
        if ctx.source_text.trim().is_empty() {
            return Err(StageError::InvalidInput(
                "document text is empty".to_string(),
            ));
        }
        if ctx.original_prompt.trim().is_empty() {
            return Err(StageError::InvalidInput("prompt is empty".to_string()));
        }

        Ok(StageResult::advance(
            ContextPatch::new().with_note("input validated, ready for enhancement"),
            StageName::Enhancement,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Transition;

    #[tokio::test]
    async fn test_manager_accepts_valid_context() {
        let stage = ManagerStage::new();
        let ctx = DocumentContext::new("some document", "a question");

        let result = stage.run(&ctx).await.unwrap();
        assert_eq!(result.next, Transition::To(StageName::Enhancement));
        assert!(result.patch.note.is_some());
    }

    #[tokio::test]
    async fn test_manager_rejects_empty_document() {
        let stage = ManagerStage::new();
        let ctx = DocumentContext::new("   ", "a question");

        let err = stage.run(&ctx).await.unwrap_err();
        assert!(matches!(err, StageError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_manager_rejects_empty_prompt() {
        let stage = ManagerStage::new();
        let ctx = DocumentContext::new("some document", "");

        let err = stage.run(&ctx).await.unwrap_err();
        assert!(matches!(err, StageError::InvalidInput(_)));
    }
}
