//! Dialogue agent
//!
//! ## Loop
//! - `DialogueOrchestrator` - bounded plan/execute loop, one call per utterance
//! - `AgentResponse` / `OrchestratorConfig` - result and loop bound
//!
//! ## Components
//! - `Planner` (`StepPlanner`) - picks the next step from a session snapshot
//! - `Executor` (`StepExecutor`) - performs a step against the session store
//! - `Step` / `StepOutcome` / `StepStatus` - the closed step vocabulary
//! - `ConfirmationClassifier` - yes/no resolution
//! - `Profile` / `ProfileField` - collected facts and their extractors

pub mod confirmation;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod profile;
pub mod step;

pub use confirmation::{parse_confirmation, Confirmation, ConfirmationClassifier, KeywordClassifier};
pub use executor::{Executor, ExecutorServices, StepExecutor};
pub use orchestrator::{AgentResponse, DialogueOrchestrator, OrchestratorConfig};
pub use planner::{Planner, StepPlanner};
pub use profile::{FieldValue, Profile, ProfileField};
pub use step::{Step, StepOutcome, StepStatus};
