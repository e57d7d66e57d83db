//! Prompt enhancement stage.

use super::{StageHandler, StageName, StageResult};
use crate::context::{ContextPatch, DocumentContext};
use crate::errors::{GenerationError, StageError};
use crate::generation::{GenerationRequest, Generator};
use crate::prompts;
use async_trait::async_trait;
use std::sync::Arc;

/// Rewrites the user's question into a precise, document-aware prompt.
#[derive(Debug)]
pub struct EnhancementStage {
    generator: Arc<dyn Generator>,
}

impl EnhancementStage {
    /// Creates the stage around a generator.
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StageHandler for EnhancementStage {
    fn stage(&self) -> StageName {
        StageName::Enhancement
    }

    async fn run(&self, ctx: &DocumentContext) -> Result<StageResult, StageError> {
        let reply = self
            .generator
            .generate(GenerationRequest::new(
                StageName::Enhancement,
                prompts::ENHANCEMENT_INSTRUCTION,
                prompts::enhancement_input(ctx),
            ))
            .await?;

        let enhanced = reply.content.trim();
        if enhanced.is_empty() {
            return Err(GenerationError::malformed("enhancement produced no prompt").into());
        }

        Ok(StageResult::advance(
            ContextPatch::new()
                .with_enhanced_prompt(enhanced)
                .with_note("prompt enhanced"),
            StageName::Processing,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Transition;
    use crate::testing::ScriptedGenerator;

    #[tokio::test]
    async fn test_enhancement_sets_enhanced_prompt() {
        let generator =
            ScriptedGenerator::new().with_reply(StageName::Enhancement, "  a sharper question  ");
        let stage = EnhancementStage::new(Arc::new(generator));
        let ctx = DocumentContext::new("doc", "vague question");

        let result = stage.run(&ctx).await.unwrap();
        assert_eq!(
            result.patch.enhanced_prompt.as_deref(),
            Some("a sharper question")
        );
        assert_eq!(result.next, Transition::To(StageName::Processing));
    }

    #[tokio::test]
    async fn test_enhancement_rejects_empty_reply() {
        let generator = ScriptedGenerator::new().with_reply(StageName::Enhancement, "   ");
        let stage = EnhancementStage::new(Arc::new(generator));
        let ctx = DocumentContext::new("doc", "question");

        let err = stage.run(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            StageError::Generation(GenerationError::MalformedResponse { .. })
        ));
    }
}
