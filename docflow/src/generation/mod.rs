//! The external generation capability.
//!
//! Stage handlers treat generation as an opaque function: a stage-scoped
//! [`GenerationRequest`] in, a [`GenerationReply`] out, failure as
//! [`GenerationError`](crate::errors::GenerationError). Retry policy for
//! transient provider failures lives behind this boundary, never in the
//! controller.

#[cfg(feature = "openai")]
pub mod openai;

use crate::errors::GenerationError;
use crate::stages::StageName;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A stage-scoped request to the generation capability.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The stage issuing the request.
    pub stage: StageName,
    /// The stage's instruction template (system role).
    pub instruction: String,
    /// The rendered input for this call (user role).
    pub input: String,
}

impl GenerationRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(
        stage: StageName,
        instruction: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            instruction: instruction.into(),
            input: input.into(),
        }
    }
}

/// Reply from the generation capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReply {
    /// The generated text.
    pub content: String,
    /// Prompt tokens consumed, when the provider reports usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    /// Completion tokens produced, when the provider reports usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    /// Wall-clock latency of the call in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

impl GenerationReply {
    /// Creates a reply carrying only text.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            input_tokens: None,
            output_tokens: None,
            latency_ms: None,
        }
    }

    /// Returns total tokens, treating missing counts as zero.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.unwrap_or(0) + self.output_tokens.unwrap_or(0)
    }
}

/// The opaque text-generation capability invoked by stage handlers.
#[async_trait]
pub trait Generator: Send + Sync + Debug {
    /// Generates text for a stage-scoped request.
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationReply, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_total_tokens() {
        let mut reply = GenerationReply::text("hello");
        assert_eq!(reply.total_tokens(), 0);

        reply.input_tokens = Some(12);
        reply.output_tokens = Some(30);
        assert_eq!(reply.total_tokens(), 42);
    }

    #[test]
    fn test_request_construction() {
        let request = GenerationRequest::new(StageName::Review, "revise", "draft + feedback");
        assert_eq!(request.stage, StageName::Review);
        assert_eq!(request.instruction, "revise");
    }
}
