//! Structural errors surfaced by the dialogue core.
//!
//! Recoverable conversation conditions (unparseable input, ambiguous
//! confirmation, empty result sets) are not errors; the executor answers
//! them with a re-prompt.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("session {0} not found")]
    SessionNotFound(String),

    /// A collaborator (eligibility, lookup, submission) failed. Not retried.
    #[error("{step} failed: {source}")]
    Collaborator {
        step: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AgentError {
    pub fn collaborator(step: &'static str, err: anyhow::Error) -> Self {
        AgentError::Collaborator {
            step,
            source: err.into(),
        }
    }
}
