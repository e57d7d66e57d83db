//! Event sinks and transition records for run observability.
//!
//! Every stage transition is reported through an [`EventSink`] as a typed
//! [`TransitionRecord`]. Sinks are purely informational: the controller never
//! changes its routing based on sink behavior, and `try_emit` must never
//! fail the run.

use crate::context::DocumentContext;
use crate::stages::StageName;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};
use uuid::Uuid;

/// Observability record captured on each stage transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The run this transition belongs to.
    pub run_id: Uuid,
    /// The stage that just completed.
    pub stage: StageName,
    /// When the transition was recorded.
    pub at: DateTime<Utc>,
    /// Short digest of the context state after the stage ran.
    pub context_digest: String,
    /// Serialized context size in bytes.
    pub context_bytes: usize,
}

impl TransitionRecord {
    /// Captures a record for the given stage and context.
    #[must_use]
    pub fn capture(run_id: Uuid, stage: StageName, ctx: &DocumentContext) -> Self {
        Self {
            run_id,
            stage,
            at: Utc::now(),
            context_digest: ctx.digest(),
            context_bytes: ctx.byte_len(),
        }
    }
}

/// Trait for event sinks that receive run observability events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Emits an event without blocking. Must never raise.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A sink that discards all events; the default when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// A sink that forwards events to the `tracing` framework.
#[derive(Debug, Clone)]
pub struct TracingEventSink {
    level: Level,
}

impl Default for TracingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl TracingEventSink {
    /// Creates a sink logging at the given level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event_type: &str, data: &Option<serde_json::Value>) {
        if self.level == Level::DEBUG {
            debug!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        } else {
            info!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        }
    }
}

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, &data);
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, &data);
    }
}

/// A sink that collects events in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Returns events whose type starts with the given prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_record_capture() {
        let ctx = DocumentContext::new("some text", "a question");
        let run_id = Uuid::new_v4();
        let record = TransitionRecord::capture(run_id, StageName::Manager, &ctx);

        assert_eq!(record.run_id, run_id);
        assert_eq!(record.stage, StageName::Manager);
        assert_eq!(record.context_digest, ctx.digest());
        assert!(record.context_bytes > 0);
    }

    #[tokio::test]
    async fn test_noop_sink_discards() {
        let sink = NoOpEventSink;
        sink.emit("stage.completed", None).await;
        sink.try_emit("stage.completed", Some(serde_json::json!({"x": 1})));
    }

    #[tokio::test]
    async fn test_collecting_sink_records_and_filters() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("stage.started", None).await;
        sink.try_emit("stage.completed", Some(serde_json::json!({"stage": "manager"})));
        sink.try_emit("run.completed", None);

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events_of_type("stage.").len(), 2);
        assert_eq!(sink.events()[2].0, "run.completed");
    }
}
