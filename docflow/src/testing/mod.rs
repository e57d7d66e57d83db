//! Deterministic test doubles for pipeline runs.
//!
//! These doubles back the crate's own tests and are exported for downstream
//! crates that want to exercise pipelines without a live provider.

use crate::context::{ContextPatch, DocumentContext};
use crate::errors::{GenerationError, StageError};
use crate::generation::{GenerationReply, GenerationRequest, Generator};
use crate::stages::{StageHandler, StageHandlerMap, StageName, StageResult, Transition};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// A generator returning canned replies per stage, in enqueue order.
///
/// Requests for a stage with no reply left fail with a malformed-response
/// error, which makes missing test fixtures loud.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<HashMap<StageName, VecDeque<String>>>,
    calls: Mutex<Vec<StageName>>,
}

impl ScriptedGenerator {
    /// Creates an empty scripted generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply for a stage (builder form).
    #[must_use]
    pub fn with_reply(self, stage: StageName, content: impl Into<String>) -> Self {
        self.enqueue(stage, content);
        self
    }

    /// Queues a reply for a stage.
    pub fn enqueue(&self, stage: StageName, content: impl Into<String>) {
        self.replies
            .lock()
            .entry(stage)
            .or_default()
            .push_back(content.into());
    }

    /// Returns the stages that requested generation, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<StageName> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationReply, GenerationError> {
        self.calls.lock().push(request.stage);

        let reply = self
            .replies
            .lock()
            .get_mut(&request.stage)
            .and_then(VecDeque::pop_front);

        reply.map(GenerationReply::text).ok_or_else(|| {
            GenerationError::malformed(format!(
                "no scripted reply for stage '{}'",
                request.stage
            ))
        })
    }
}

/// A generator that fails at one stage and answers generically elsewhere.
#[derive(Debug)]
pub struct FailingGenerator {
    fail_at: StageName,
    detail: String,
}

impl FailingGenerator {
    /// Creates a generator failing at the given stage.
    #[must_use]
    pub fn at(stage: StageName) -> Self {
        Self {
            fail_at: stage,
            detail: "synthetic provider outage".to_string(),
        }
    }

    /// Sets the failure detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationReply, GenerationError> {
        if request.stage == self.fail_at {
            return Err(GenerationError::provider(self.detail.clone(), false));
        }
        Ok(GenerationReply::text("stub reply"))
    }
}

/// A handler returning a fixed result, for controller routing tests.
#[derive(Debug)]
pub struct StubHandler {
    stage: StageName,
    patch: ContextPatch,
    next: Transition,
}

impl StubHandler {
    /// Creates a stub for a stage with a transition directive.
    #[must_use]
    pub fn new(stage: StageName, next: Transition) -> Self {
        Self {
            stage,
            patch: ContextPatch::new(),
            next,
        }
    }

    /// Sets the patch the stub returns on every call.
    #[must_use]
    pub fn with_patch(mut self, patch: ContextPatch) -> Self {
        self.patch = patch;
        self
    }
}

#[async_trait]
impl StageHandler for StubHandler {
    fn stage(&self) -> StageName {
        self.stage
    }

    async fn run(&self, _ctx: &DocumentContext) -> Result<StageResult, StageError> {
        Ok(StageResult {
            patch: self.patch.clone(),
            next: self.next,
        })
    }
}

/// Builds a handler map keyed by each handler's stage.
#[must_use]
pub fn handler_map(handlers: Vec<Arc<dyn StageHandler>>) -> StageHandlerMap {
    handlers
        .into_iter()
        .map(|handler| (handler.stage(), handler))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_generator_replays_in_order() {
        let generator = ScriptedGenerator::new()
            .with_reply(StageName::Processing, "first")
            .with_reply(StageName::Processing, "second");

        let request =
            GenerationRequest::new(StageName::Processing, "instruction", "input");
        let first = generator.generate(request.clone()).await.unwrap();
        let second = generator.generate(request.clone()).await.unwrap();

        assert_eq!(first.content, "first");
        assert_eq!(second.content, "second");
        assert!(generator.generate(request).await.is_err());
        assert_eq!(generator.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_failing_generator_scopes_failure() {
        let generator = FailingGenerator::at(StageName::Validation);

        let ok = generator
            .generate(GenerationRequest::new(StageName::Review, "i", "x"))
            .await;
        assert!(ok.is_ok());

        let err = generator
            .generate(GenerationRequest::new(StageName::Validation, "i", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Provider { .. }));
    }
}
