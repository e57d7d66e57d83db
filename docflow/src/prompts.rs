//! Per-stage instruction templates and input renderers.
//!
//! Instructions are the system-role half of a generation call; the renderers
//! assemble the user-role input from the current context. Prompt wording
//! lives here so it can change without touching handler logic.

use crate::context::DocumentContext;

/// Character cap for document excerpts embedded in prompts that do not need
/// the full text.
const SOURCE_EXCERPT_CHARS: usize = 4000;

/// Instruction for the Enhancement stage.
pub const ENHANCEMENT_INSTRUCTION: &str = "\
You refine user questions about a document. Rewrite the question into a \
precise, self-contained prompt: resolve vague references, use the terms the \
document itself uses, and state the expected answer format. Reply with the \
rewritten prompt only.";

/// Instruction for the extraction half of the Processing stage.
pub const EXTRACTION_INSTRUCTION: &str = "\
You organize document content. From the document below, extract the passages \
and facts relevant to the prompt, preserving numbers, names, and order of \
appearance. Reply with the organized extract only.";

/// Instruction for the drafting half of the Processing stage.
pub const DRAFT_INSTRUCTION: &str = "\
You answer questions strictly from provided document content. Using only the \
extract below, answer the prompt. Do not introduce facts that are not in the \
extract.";

/// Instruction for the Validation stage.
pub const VALIDATION_INSTRUCTION: &str = "\
You grade answers against source documents. Compare the answer with the \
document and rate its faithfulness and completeness. Reply with exactly two \
lines:\n\
Score: <integer 0-100>\n\
Feedback: <concrete issues, or a confirmation that the answer holds>";

/// Instruction for the Review stage.
pub const REVIEW_INSTRUCTION: &str = "\
You revise answers that failed validation. Apply the feedback to the draft, \
correcting only what the feedback calls out and keeping every claim grounded \
in the document. Reply with the revised answer only.";

/// Renders the Enhancement input: document excerpt, question, and any
/// caller-supplied context.
#[must_use]
pub fn enhancement_input(ctx: &DocumentContext) -> String {
    let mut input = format!(
        "Document (excerpt):\n{}\n\nQuestion:\n{}",
        excerpt(&ctx.source_text, SOURCE_EXCERPT_CHARS),
        ctx.original_prompt
    );

    if !ctx.additional_context.is_empty() {
        input.push_str("\n\nAdditional context:");
        let mut keys: Vec<&String> = ctx.additional_context.keys().collect();
        keys.sort();
        for key in keys {
            input.push_str(&format!("\n- {}: {}", key, ctx.additional_context[key]));
        }
    }

    input
}

/// Renders the extraction input: full document plus the effective prompt.
#[must_use]
pub fn extraction_input(ctx: &DocumentContext) -> String {
    format!(
        "Document:\n{}\n\nPrompt:\n{}",
        ctx.source_text,
        ctx.effective_prompt()
    )
}

/// Renders the drafting input: the organized extract plus the effective
/// prompt.
#[must_use]
pub fn draft_input(ctx: &DocumentContext) -> String {
    format!(
        "Extract:\n{}\n\nPrompt:\n{}",
        ctx.extracted_content.as_deref().unwrap_or_default(),
        ctx.effective_prompt()
    )
}

/// Renders the validation input: full document plus the draft answer.
#[must_use]
pub fn validation_input(ctx: &DocumentContext) -> String {
    format!(
        "Document:\n{}\n\nAnswer:\n{}",
        ctx.source_text,
        ctx.draft_answer.as_deref().unwrap_or_default()
    )
}

/// Renders the review input: document excerpt, failing draft, and the
/// validation feedback.
#[must_use]
pub fn review_input(ctx: &DocumentContext) -> String {
    format!(
        "Document (excerpt):\n{}\n\nDraft:\n{}\n\nFeedback:\n{}",
        excerpt(&ctx.source_text, SOURCE_EXCERPT_CHARS),
        ctx.draft_answer.as_deref().unwrap_or_default(),
        ctx.validation
            .as_ref()
            .map(|outcome| outcome.feedback.as_str())
            .unwrap_or_default()
    )
}

/// Truncates text to at most `max_chars` characters, marking the cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str(" [...]");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextPatch, ValidationOutcome};
    use std::collections::HashMap;

    #[test]
    fn test_enhancement_input_includes_additional_context_sorted() {
        let mut extra = HashMap::new();
        extra.insert("format".to_string(), "bullet points".to_string());
        extra.insert("audience".to_string(), "executives".to_string());

        let ctx = DocumentContext::new("body", "question").with_additional_context(extra);
        let input = enhancement_input(&ctx);

        assert!(input.contains("Question:\nquestion"));
        let audience = input.find("audience").unwrap();
        let format = input.find("format").unwrap();
        assert!(audience < format);
    }

    #[test]
    fn test_draft_input_uses_enhanced_prompt() {
        let mut ctx = DocumentContext::new("body", "original");
        ctx.apply(
            ContextPatch::new()
                .with_enhanced_prompt("enhanced")
                .with_extracted_content("the extract"),
        );

        let input = draft_input(&ctx);
        assert!(input.contains("the extract"));
        assert!(input.contains("enhanced"));
        assert!(!input.contains("original"));
    }

    #[test]
    fn test_review_input_carries_feedback() {
        let mut ctx = DocumentContext::new("body", "question");
        ctx.apply(
            ContextPatch::new()
                .with_draft_answer("a draft")
                .with_validation(ValidationOutcome::new(40, "cite section 2")),
        );

        let input = review_input(&ctx);
        assert!(input.contains("a draft"));
        assert!(input.contains("cite section 2"));
    }

    #[test]
    fn test_excerpt_truncates_long_text() {
        let long = "x".repeat(SOURCE_EXCERPT_CHARS + 100);
        let cut = excerpt(&long, SOURCE_EXCERPT_CHARS);
        assert!(cut.ends_with("[...]"));
        assert!(cut.chars().count() < long.chars().count());

        assert_eq!(excerpt("short", SOURCE_EXCERPT_CHARS), "short");
    }
}
