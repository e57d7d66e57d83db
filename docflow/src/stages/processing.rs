//! Content extraction and answer drafting stage.

use super::{StageHandler, StageName, StageResult};
use crate::context::{ContextPatch, DocumentContext};
use crate::errors::{GenerationError, StageError};
use crate::generation::{GenerationRequest, Generator};
use crate::prompts;
use async_trait::async_trait;
use std::sync::Arc;

/// Extracts the relevant document content, then drafts an answer from it.
///
/// Two sequential generation calls: the extract keeps the draft grounded in
/// what the document actually says rather than in the model's priors.
#[derive(Debug)]
pub struct ProcessingStage {
    generator: Arc<dyn Generator>,
}

impl ProcessingStage {
    /// Creates the stage around a generator.
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl StageHandler for ProcessingStage {
    fn stage(&self) -> StageName {
        StageName::Processing
    }

    async fn run(&self, ctx: &DocumentContext) -> Result<StageResult, StageError> {
        let extract_reply = self
            .generator
            .generate(GenerationRequest::new(
                StageName::Processing,
                prompts::EXTRACTION_INSTRUCTION,
                prompts::extraction_input(ctx),
            ))
            .await?;

        let extracted = extract_reply.content.trim().to_string();
        if extracted.is_empty() {
            return Err(GenerationError::malformed("extraction produced no content").into());
        }

        // Draft from the extract, not the raw document.
        let mut staged = ctx.clone();
        staged.apply(ContextPatch::new().with_extracted_content(extracted.clone()));

        let draft_reply = self
            .generator
            .generate(GenerationRequest::new(
                StageName::Processing,
                prompts::DRAFT_INSTRUCTION,
                prompts::draft_input(&staged),
            ))
            .await?;

        let draft = draft_reply.content.trim();
        if draft.is_empty() {
            return Err(GenerationError::malformed("drafting produced no answer").into());
        }

        Ok(StageResult::advance(
            ContextPatch::new()
                .with_extracted_content(extracted)
                .with_draft_answer(draft)
                .with_note("content extracted and answer drafted"),
            StageName::Validation,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Transition;
    use crate::testing::{FailingGenerator, ScriptedGenerator};

    #[tokio::test]
    async fn test_processing_fills_extract_and_draft() {
        let generator = ScriptedGenerator::new()
            .with_reply(StageName::Processing, "key passages")
            .with_reply(StageName::Processing, "the drafted answer");
        let stage = ProcessingStage::new(Arc::new(generator));
        let ctx = DocumentContext::new("doc", "question");

        let result = stage.run(&ctx).await.unwrap();
        assert_eq!(
            result.patch.extracted_content.as_deref(),
            Some("key passages")
        );
        assert_eq!(
            result.patch.draft_answer.as_deref(),
            Some("the drafted answer")
        );
        assert_eq!(result.next, Transition::To(StageName::Validation));
    }

    #[tokio::test]
    async fn test_processing_surfaces_generation_failure() {
        let generator = FailingGenerator::at(StageName::Processing);
        let stage = ProcessingStage::new(Arc::new(generator));
        let ctx = DocumentContext::new("doc", "question");

        let err = stage.run(&ctx).await.unwrap_err();
        assert!(matches!(err, StageError::Generation(_)));
    }
}
