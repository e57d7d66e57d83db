//! The stage-transition state machine.

use super::RunFailure;
use crate::cancellation::CancellationToken;
use crate::config::PipelineConfig;
use crate::context::DocumentContext;
use crate::errors::{DocflowError, StageError};
use crate::events::{EventSink, NoOpEventSink, TransitionRecord};
use crate::stages::{StageHandlerMap, StageName, StageResult, Transition};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Successful outcome of a controller run.
#[derive(Debug)]
pub struct PipelineRun {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// The final context, including history and the accepted answer.
    pub context: DocumentContext,
    /// Review cycles consumed.
    pub review_cycles: u32,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl PipelineRun {
    /// Wall-clock duration of the run in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64
    }
}

/// Drives one context through the fixed stage graph.
///
/// The controller owns the transition table and the score gate; handlers
/// propose transitions, the controller enforces them. It never retries a
/// stage: external-call retry policy belongs to the generation capability.
pub struct StageController {
    handlers: StageHandlerMap,
    config: PipelineConfig,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for StageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageController")
            .field("stages", &self.handlers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl StageController {
    /// Creates a controller over an immutable handler map.
    #[must_use]
    pub fn new(handlers: StageHandlerMap, config: PipelineConfig) -> Self {
        Self {
            handlers,
            config,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The static transition table: which stages may follow the given one.
    #[must_use]
    pub fn allowed_next(stage: StageName) -> &'static [StageName] {
        match stage {
            StageName::Manager => &[StageName::Enhancement],
            StageName::Enhancement => &[StageName::Processing],
            StageName::Processing => &[StageName::Validation],
            StageName::Validation => &[StageName::Completion, StageName::Review],
            StageName::Review => &[StageName::Validation],
            StageName::Completion | StageName::Failed => &[],
        }
    }

    /// Runs a context to a terminal state.
    pub async fn run(&self, context: DocumentContext) -> Result<PipelineRun, RunFailure> {
        self.run_with_cancellation(context, &CancellationToken::new())
            .await
    }

    /// Runs a context, checking the token between stage boundaries.
    pub async fn run_with_cancellation(
        &self,
        mut ctx: DocumentContext,
        token: &CancellationToken,
    ) -> Result<PipelineRun, RunFailure> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut review_cycles = 0u32;
        let mut current = StageName::Manager;

        loop {
            if token.is_cancelled() {
                let reason = token
                    .reason()
                    .unwrap_or_else(|| "cancelled by caller".to_string());
                self.sink.try_emit(
                    "run.cancelled",
                    Some(serde_json::json!({
                        "run_id": run_id,
                        "stage": current.as_str(),
                        "reason": reason,
                    })),
                );
                let last_stage = ctx.history.last().copied();
                return Err(RunFailure::new(
                    DocflowError::Cancelled(reason),
                    last_stage,
                    ctx,
                ));
            }

            let Some(handler) = self.handlers.get(&current) else {
                let last_stage = ctx.history.last().copied();
                return Err(RunFailure::new(
                    DocflowError::Internal(format!(
                        "no handler registered for stage '{current}'"
                    )),
                    last_stage,
                    ctx,
                ));
            };

            debug!(run_id = %run_id, stage = %current, "running stage");
            self.sink.try_emit(
                "stage.started",
                Some(serde_json::json!({
                    "run_id": run_id,
                    "stage": current.as_str(),
                })),
            );

            let StageResult { patch, next } = match handler.run(&ctx).await {
                Ok(result) => result,
                Err(err) => {
                    ctx.history.push(current);
                    self.sink.try_emit(
                        "stage.failed",
                        Some(serde_json::json!({
                            "run_id": run_id,
                            "stage": current.as_str(),
                            "error": err.to_string(),
                        })),
                    );
                    let error = match err {
                        StageError::InvalidInput(detail) => DocflowError::InvalidInput(detail),
                        StageError::Generation(source) => DocflowError::Generation {
                            stage: current,
                            source,
                        },
                    };
                    return Err(RunFailure::new(error, Some(current), ctx));
                }
            };

            ctx.apply(patch);
            ctx.history.push(current);

            let record = TransitionRecord::capture(run_id, current, &ctx);
            self.sink
                .try_emit("stage.completed", serde_json::to_value(&record).ok());

            let target = match current {
                StageName::Validation => {
                    match self.gate_validation(&ctx, next, &mut review_cycles) {
                        Ok(target) => target,
                        Err(error) => {
                            if matches!(error, DocflowError::RetryBoundExceeded { .. }) {
                                // Review cycles exhausted: the run ends in
                                // the Failed terminal state.
                                ctx.history.push(StageName::Failed);
                                self.sink.try_emit(
                                    "run.failed",
                                    Some(serde_json::json!({
                                        "run_id": run_id,
                                        "review_cycles": review_cycles,
                                    })),
                                );
                            }
                            return Err(RunFailure::new(
                                error,
                                Some(StageName::Validation),
                                ctx,
                            ));
                        }
                    }
                }
                _ => match next {
                    Transition::Terminate if current == StageName::Completion => None,
                    Transition::Terminate => {
                        return Err(RunFailure::new(
                            DocflowError::Internal(format!(
                                "stage '{current}' may not terminate the run"
                            )),
                            Some(current),
                            ctx,
                        ));
                    }
                    Transition::To(target) => {
                        if Self::allowed_next(current).contains(&target) {
                            Some(target)
                        } else {
                            return Err(RunFailure::new(
                                DocflowError::Internal(format!(
                                    "illegal transition '{current}' -> '{target}'"
                                )),
                                Some(current),
                                ctx,
                            ));
                        }
                    }
                },
            };

            match target {
                Some(next_stage) => current = next_stage,
                None => break,
            }
        }

        let finished_at = Utc::now();
        self.sink.try_emit(
            "run.completed",
            Some(serde_json::json!({
                "run_id": run_id,
                "stages": ctx.history.len(),
                "review_cycles": review_cycles,
            })),
        );

        Ok(PipelineRun {
            run_id,
            context: ctx,
            review_cycles,
            started_at,
            finished_at,
        })
    }

    /// Applies the authoritative score gate after a Validation run.
    ///
    /// Returns the next stage, or `RetryBoundExceeded` once the counter
    /// passes the configured bound.
    fn gate_validation(
        &self,
        ctx: &DocumentContext,
        proposed: Transition,
        review_cycles: &mut u32,
    ) -> Result<Option<StageName>, DocflowError> {
        let Some(outcome) = ctx.validation.as_ref() else {
            return Err(DocflowError::Internal(
                "validation stage produced no outcome".to_string(),
            ));
        };

        let target = if outcome.passes(self.config.score_threshold) {
            StageName::Completion
        } else {
            if *review_cycles >= self.config.max_review_cycles {
                return Err(DocflowError::RetryBoundExceeded {
                    cycles: *review_cycles,
                });
            }
            *review_cycles += 1;
            StageName::Review
        };

        if proposed != Transition::To(target) {
            warn!(
                score = outcome.score,
                threshold = self.config.score_threshold,
                ?proposed,
                gated = %target,
                "validation handler proposed a different transition; score gate wins"
            );
        }

        Ok(Some(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table_shape() {
        assert_eq!(
            StageController::allowed_next(StageName::Manager),
            &[StageName::Enhancement]
        );
        assert_eq!(
            StageController::allowed_next(StageName::Validation),
            &[StageName::Completion, StageName::Review]
        );
        assert_eq!(
            StageController::allowed_next(StageName::Review),
            &[StageName::Validation]
        );
        assert!(StageController::allowed_next(StageName::Completion).is_empty());
        assert!(StageController::allowed_next(StageName::Failed).is_empty());
    }
}
