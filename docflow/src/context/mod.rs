//! The accumulating run context passed between stages.
//!
//! A [`DocumentContext`] is owned exclusively by the controller for the
//! duration of one run; stages read it and return a [`ContextPatch`] of
//! updates, never mutating it directly.

mod document;
mod outcome;

pub use document::{ContextPatch, DocumentContext};
pub use outcome::ValidationOutcome;
