//! The mutable record carried through one pipeline run.

use super::ValidationOutcome;
use crate::stages::StageName;
use crate::utils::short_digest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Context for one document question-answering run.
///
/// Holds the source text and prompt alongside everything the stages
/// accumulate: the enhanced prompt, extracted content, draft and final
/// answers, the latest validation outcome, and the ordered history of
/// stages visited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Raw text of the source document.
    pub source_text: String,
    /// The user's original question.
    pub original_prompt: String,
    /// Caller-supplied key/value context (audience, format hints, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub additional_context: HashMap<String, String>,
    /// Document-aware rewrite of the prompt, set by Enhancement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<String>,
    /// Organized extract of the relevant document content, set by Processing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_content: Option<String>,
    /// Candidate answer, set by Processing and rewritten by Review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_answer: Option<String>,
    /// Latest scoring outcome, set by Validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationOutcome>,
    /// Accepted answer, set by Completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    /// Ordered sequence of stages visited.
    #[serde(default)]
    pub history: Vec<StageName>,
    /// Ordered stage notes, one per note-emitting stage execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl DocumentContext {
    /// Creates a context from source text and a prompt.
    #[must_use]
    pub fn new(source_text: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            original_prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Sets caller-supplied additional context.
    #[must_use]
    pub fn with_additional_context(mut self, context: HashMap<String, String>) -> Self {
        self.additional_context = context;
        self
    }

    /// Merges a stage patch into the context.
    pub fn apply(&mut self, patch: ContextPatch) {
        if let Some(value) = patch.enhanced_prompt {
            self.enhanced_prompt = Some(value);
        }
        if let Some(value) = patch.extracted_content {
            self.extracted_content = Some(value);
        }
        if let Some(value) = patch.draft_answer {
            self.draft_answer = Some(value);
        }
        if let Some(value) = patch.validation {
            self.validation = Some(value);
        }
        if let Some(value) = patch.final_answer {
            self.final_answer = Some(value);
        }
        if let Some(note) = patch.note {
            self.notes.push(note);
        }
    }

    /// Returns the enhanced prompt when present, else the original.
    #[must_use]
    pub fn effective_prompt(&self) -> &str {
        self.enhanced_prompt
            .as_deref()
            .unwrap_or(&self.original_prompt)
    }

    /// Counts Review entries in the history.
    #[must_use]
    pub fn review_count(&self) -> usize {
        self.history
            .iter()
            .filter(|stage| **stage == StageName::Review)
            .count()
    }

    /// Approximate serialized size of the context in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        serde_json::to_vec(self).map_or(0, |bytes| bytes.len())
    }

    /// Short hex digest of the serialized context state.
    #[must_use]
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        short_digest(&bytes)
    }
}

/// Context fields a stage wants merged after it runs.
///
/// Unset fields leave the context untouched; `note` appends rather than
/// replaces.
#[derive(Debug, Clone, Default)]
pub struct ContextPatch {
    /// Replacement for `enhanced_prompt`.
    pub enhanced_prompt: Option<String>,
    /// Replacement for `extracted_content`.
    pub extracted_content: Option<String>,
    /// Replacement for `draft_answer`.
    pub draft_answer: Option<String>,
    /// Replacement for `validation`.
    pub validation: Option<ValidationOutcome>,
    /// Replacement for `final_answer`.
    pub final_answer: Option<String>,
    /// Note to append to the context's note list.
    pub note: Option<String>,
}

impl ContextPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the enhanced prompt.
    #[must_use]
    pub fn with_enhanced_prompt(mut self, value: impl Into<String>) -> Self {
        self.enhanced_prompt = Some(value.into());
        self
    }

    /// Sets the extracted content.
    #[must_use]
    pub fn with_extracted_content(mut self, value: impl Into<String>) -> Self {
        self.extracted_content = Some(value.into());
        self
    }

    /// Sets the draft answer.
    #[must_use]
    pub fn with_draft_answer(mut self, value: impl Into<String>) -> Self {
        self.draft_answer = Some(value.into());
        self
    }

    /// Sets the validation outcome.
    #[must_use]
    pub fn with_validation(mut self, outcome: ValidationOutcome) -> Self {
        self.validation = Some(outcome);
        self
    }

    /// Sets the final answer.
    #[must_use]
    pub fn with_final_answer(mut self, value: impl Into<String>) -> Self {
        self.final_answer = Some(value.into());
        self
    }

    /// Appends a stage note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_set_fields_only() {
        let mut ctx = DocumentContext::new("text", "question");
        ctx.apply(
            ContextPatch::new()
                .with_enhanced_prompt("better question")
                .with_note("enhanced"),
        );

        assert_eq!(ctx.enhanced_prompt.as_deref(), Some("better question"));
        assert!(ctx.draft_answer.is_none());
        assert_eq!(ctx.notes, vec!["enhanced".to_string()]);

        // A later empty patch leaves everything in place.
        ctx.apply(ContextPatch::new());
        assert_eq!(ctx.enhanced_prompt.as_deref(), Some("better question"));
    }

    #[test]
    fn test_effective_prompt_prefers_enhancement() {
        let mut ctx = DocumentContext::new("text", "original");
        assert_eq!(ctx.effective_prompt(), "original");

        ctx.apply(ContextPatch::new().with_enhanced_prompt("enhanced"));
        assert_eq!(ctx.effective_prompt(), "enhanced");
    }

    #[test]
    fn test_review_count() {
        let mut ctx = DocumentContext::new("text", "question");
        ctx.history = vec![
            StageName::Manager,
            StageName::Validation,
            StageName::Review,
            StageName::Validation,
            StageName::Review,
        ];
        assert_eq!(ctx.review_count(), 2);
    }

    #[test]
    fn test_digest_is_stable_and_state_sensitive() {
        let ctx = DocumentContext::new("text", "question");
        assert_eq!(ctx.digest(), ctx.digest());

        let mut changed = ctx.clone();
        changed.apply(ContextPatch::new().with_draft_answer("answer"));
        assert_ne!(ctx.digest(), changed.digest());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut ctx = DocumentContext::new("text", "question");
        ctx.apply(
            ContextPatch::new()
                .with_draft_answer("answer")
                .with_validation(ValidationOutcome::new(80, "fine")),
        );
        ctx.history.push(StageName::Manager);

        let json = serde_json::to_string(&ctx).unwrap();
        let deserialized: DocumentContext = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.draft_answer.as_deref(), Some("answer"));
        assert_eq!(deserialized.history, vec![StageName::Manager]);
    }
}
