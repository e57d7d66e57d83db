//! Pipeline assembly and the stage-transition controller.
//!
//! [`StageController`] is the state machine; [`DocumentPipeline`] is the
//! facade that wires the six default stage handlers to a generator and
//! exposes the invocation boundary.

mod controller;
mod report;


pub use controller::{PipelineRun, StageController};
pub use report::{DocumentRequest, RunFailure, RunReport, RunSummary};

use crate::cancellation::CancellationToken;
use crate::config::{PipelineConfig, DEFAULT_SCORE_THRESHOLD};
use crate::errors::PipelineBuildError;
use crate::events::{EventSink, NoOpEventSink};
use crate::generation::Generator;
use crate::stages::{
    CompletionStage, EnhancementStage, ManagerStage, ProcessingStage, ReviewStage,
    StageHandler, StageHandlerMap, ValidationStage,
};
use std::sync::Arc;

/// The assembled document question-answering pipeline.
#[derive(Debug)]
pub struct DocumentPipeline {
    controller: StageController,
}

impl DocumentPipeline {
    /// Starts building a pipeline.
    #[must_use]
    pub fn builder() -> DocumentPipelineBuilder {
        DocumentPipelineBuilder::new()
    }

    /// Returns the underlying controller.
    #[must_use]
    pub fn controller(&self) -> &StageController {
        &self.controller
    }

    /// Runs a request to a terminal state.
    pub async fn run(&self, request: DocumentRequest) -> Result<RunReport, RunFailure> {
        self.run_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Runs a request, honoring the token between stage boundaries.
    pub async fn run_with_cancellation(
        &self,
        request: DocumentRequest,
        token: &CancellationToken,
    ) -> Result<RunReport, RunFailure> {
        let run = self
            .controller
            .run_with_cancellation(request.into_context(), token)
            .await?;
        Ok(RunReport::from_run(run))
    }
}

/// Builder for [`DocumentPipeline`].
///
/// The generator and the review-cycle bound are required; everything else
/// has defaults.
pub struct DocumentPipelineBuilder {
    generator: Option<Arc<dyn Generator>>,
    max_review_cycles: Option<u32>,
    score_threshold: u8,
    sink: Arc<dyn EventSink>,
}

impl Default for DocumentPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentPipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generator: None,
            max_review_cycles: None,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the generation capability.
    #[must_use]
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Sets the required review-cycle bound.
    #[must_use]
    pub fn max_review_cycles(mut self, bound: u32) -> Self {
        self.max_review_cycles = Some(bound);
        self
    }

    /// Sets the validation pass mark.
    #[must_use]
    pub fn score_threshold(mut self, threshold: u8) -> Self {
        self.score_threshold = threshold.min(100);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Fails if no generator was configured, or if the review-cycle bound
    /// was not set (it has no default by design).
    pub fn build(self) -> Result<DocumentPipeline, PipelineBuildError> {
        let generator = self
            .generator
            .ok_or_else(|| PipelineBuildError::new("no generator configured"))?;
        let max_review_cycles = self.max_review_cycles.ok_or_else(|| {
            PipelineBuildError::new("max_review_cycles is required and has no default")
        })?;

        let config = PipelineConfig::new(max_review_cycles)
            .with_score_threshold(self.score_threshold);

        let handlers: Vec<Arc<dyn StageHandler>> = vec![
            Arc::new(ManagerStage::new()),
            Arc::new(EnhancementStage::new(generator.clone())),
            Arc::new(ProcessingStage::new(generator.clone())),
            Arc::new(ValidationStage::new(
                generator.clone(),
                config.score_threshold,
            )),
            Arc::new(ReviewStage::new(generator)),
            Arc::new(CompletionStage::new()),
        ];
        let map: StageHandlerMap = handlers
            .into_iter()
            .map(|handler| (handler.stage(), handler))
            .collect();

        Ok(DocumentPipeline {
            controller: StageController::new(map, config).with_event_sink(self.sink),
        })
    }
}
