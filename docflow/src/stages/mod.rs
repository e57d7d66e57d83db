//! Stage names, results, and the handler capability interface.
//!
//! Stages are the fundamental units of work in a docflow run. Each stage is
//! a variant of the closed [`StageName`] enum and is implemented by a
//! [`StageHandler`] selected from an immutable map injected into the
//! controller, not by subclass dispatch.

mod completion;
mod enhancement;
mod manager;
mod processing;
mod review;
mod validation;

pub use completion::CompletionStage;
pub use enhancement::EnhancementStage;
pub use manager::ManagerStage;
pub use processing::ProcessingStage;
pub use review::ReviewStage;
pub use validation::ValidationStage;

use crate::context::{ContextPatch, DocumentContext};
use crate::errors::StageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

/// One named step in the fixed pipeline.
///
/// `Completion` and `Failed` are terminal; `Failed` has no handler and is
/// entered only by the controller when review cycles are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    /// Entry stage validating the incoming context.
    Manager,
    /// Prompt enhancement.
    Enhancement,
    /// Content extraction and answer drafting.
    Processing,
    /// Draft scoring against the source text.
    Validation,
    /// Draft revision after a failed validation.
    Review,
    /// Successful terminal stage.
    Completion,
    /// Terminal stage entered when review cycles are exhausted.
    Failed,
}

impl StageName {
    /// Returns the lowercase stage name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Enhancement => "enhancement",
            Self::Processing => "processing",
            Self::Validation => "validation",
            Self::Review => "review",
            Self::Completion => "completion",
            Self::Failed => "failed",
        }
    }

    /// Returns true if the stage ends a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completion | Self::Failed)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directive returned by a stage handler: where the run goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Continue at the named stage.
    To(StageName),
    /// End the run.
    Terminate,
}

/// Output of a stage handler: context updates plus a transition directive.
#[derive(Debug, Clone)]
pub struct StageResult {
    /// Context fields to merge into the run context.
    pub patch: ContextPatch,
    /// Where the handler proposes the run goes next.
    pub next: Transition,
}

impl StageResult {
    /// Creates a result that advances to the given stage.
    #[must_use]
    pub fn advance(patch: ContextPatch, next: StageName) -> Self {
        Self {
            patch,
            next: Transition::To(next),
        }
    }

    /// Creates a result that ends the run.
    #[must_use]
    pub fn terminate(patch: ContextPatch) -> Self {
        Self {
            patch,
            next: Transition::Terminate,
        }
    }
}

/// Capability interface implemented by every stage.
///
/// Handlers receive the current context read-only and return a
/// [`StageResult`]; the controller applies the patch, appends the stage to
/// the run history, and dispatches on the transition directive.
#[async_trait]
pub trait StageHandler: Send + Sync + Debug {
    /// The stage this handler implements.
    fn stage(&self) -> StageName;

    /// Executes the stage against the current context.
    async fn run(&self, ctx: &DocumentContext) -> Result<StageResult, StageError>;
}

/// Immutable map from stage name to handler, injected into the controller.
pub type StageHandlerMap = HashMap<StageName, Arc<dyn StageHandler>>;
