//! # Docflow
//!
//! A staged pipeline for grounded document question answering.
//!
//! Docflow takes raw document text and a user question, then drives them
//! through a fixed sequence of stages:
//!
//! - **Manager**: validates the incoming context
//! - **Enhancement**: refines the question into a document-aware prompt
//! - **Processing**: extracts relevant content and drafts an answer
//! - **Validation**: scores the draft against the source text
//! - **Review**: revises a draft that failed validation (loops back)
//! - **Completion**: promotes the accepted draft to the final answer
//!
//! Routing is score-gated: a draft scoring at or above the configured
//! threshold proceeds to Completion, anything below loops through Review a
//! bounded number of times before the run is failed. All semantic work is
//! delegated to a [`generation::Generator`] capability; the library itself
//! is a deterministic state machine.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docflow::prelude::*;
//!
//! let pipeline = DocumentPipeline::builder()
//!     .generator(generator)
//!     .max_review_cycles(2)
//!     .build()?;
//!
//! let report = pipeline
//!     .run(DocumentRequest::new(document_text, "What does section 3 claim?"))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod generation;
pub mod pipeline;
pub mod prompts;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::PipelineConfig;
    pub use crate::context::{ContextPatch, DocumentContext, ValidationOutcome};
    pub use crate::errors::{
        DocflowError, GenerationError, PipelineBuildError, StageError,
    };
    pub use crate::events::{
        CollectingEventSink, EventSink, NoOpEventSink, TracingEventSink,
        TransitionRecord,
    };
    pub use crate::generation::{GenerationReply, GenerationRequest, Generator};
    pub use crate::pipeline::{
        DocumentPipeline, DocumentRequest, RunFailure, RunReport, RunSummary,
        StageController,
    };
    pub use crate::stages::{
        StageHandler, StageHandlerMap, StageName, StageResult, Transition,
    };
    pub use crate::utils::{iso_timestamp, short_digest, Timestamp};
}
