//! Vaani core library
//!
//! Everything the voice assistant needs below the transport layer:
//! - `agent` - planner, executor and the bounded orchestration loop
//! - `storage` - per-session state (profile, waiting mode, history, offers)
//! - `schemes` - eligibility evaluation, offer lookup and application submission
//! - `speech` - recognizer/synthesizer adapters and confidence scoring
//! - `config` - TOML configuration with environment overrides

pub mod agent;
pub mod config;
pub mod constants;
pub mod error;
pub mod paths;
pub mod schemes;
pub mod speech;
pub mod storage;

pub use agent::{AgentResponse, DialogueOrchestrator};
pub use config::VaaniConfig;
pub use error::AgentError;
pub use storage::SessionStore;
