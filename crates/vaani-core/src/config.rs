//! Configuration
//!
//! Read from `~/.vaani/config.toml` (missing file means defaults), then
//! overridden by environment variables:
//!
//! | variable | setting |
//! |----------|---------|
//! | `VAANI_ASR_CONFIDENCE_THRESHOLD` | `agent.confidence_threshold` |
//! | `VAANI_LANGUAGE` | `agent.language` |
//! | `VAANI_ASR_PROVIDER` | `speech.provider` (`openai`/`http` or `local`/`none`) |
//! | `VAANI_ASR_BASE_URL` | `speech.base_url` |
//! | `VAANI_API_KEY`, `OPENAI_API_KEY` | `speech.api_key` |
//! | `VAANI_SCHEMES_PATH` | `schemes_path` |
//! | `PORT` | `server.port` |

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::agent::ProfileField;
use crate::constants::agent::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_LANGUAGE, DEFAULT_REQUIRED_FIELDS, ITERATION_SLACK,
};
use crate::error::AgentError;
use crate::paths;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaaniConfig {
    pub agent: AgentSettings,
    pub speech: SpeechSettings,
    pub server: ServerSettings,
    /// Scheme catalog JSON. Falls back to `~/.vaani/schemes.json`, then the
    /// built-in catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemes_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub confidence_threshold: f64,
    pub required_fields: Vec<String>,
    /// Overrides the derived loop bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    pub language: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            required_fields: DEFAULT_REQUIRED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
            max_iterations: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl AgentSettings {
    /// Loop bound: explicit override, else one per required field plus slack.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
            .unwrap_or(self.required_fields.len() + ITERATION_SLACK)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    /// OpenAI-compatible HTTP API.
    #[serde(alias = "openai")]
    Http,
    #[default]
    #[serde(alias = "local", alias = "none")]
    Disabled,
}

impl SpeechProvider {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" | "http" => Some(SpeechProvider::Http),
            "local" | "none" | "disabled" => Some(SpeechProvider::Disabled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub provider: SpeechProvider,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub asr_model: String,
    pub tts_model: String,
    pub voice: String,
    pub timeout_secs: u64,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            provider: SpeechProvider::Disabled,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            asr_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    /// Scratch directory for uploads and synthesized replies.
    pub tmp_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            tmp_dir: PathBuf::from("tmp"),
        }
    }
}

impl VaaniConfig {
    /// Load `~/.vaani/config.toml` with environment overrides applied.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&paths::config_file())?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. A missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: VaaniConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("VAANI_ASR_CONFIDENCE_THRESHOLD") {
            self.agent.confidence_threshold = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid VAANI_ASR_CONFIDENCE_THRESHOLD: {value}"))?;
        }
        if let Some(value) = lookup("VAANI_LANGUAGE") {
            self.agent.language = value;
        }
        if let Some(value) = lookup("VAANI_ASR_PROVIDER") {
            self.speech.provider = SpeechProvider::parse(&value)
                .with_context(|| format!("Unknown VAANI_ASR_PROVIDER: {value}"))?;
        }
        if let Some(value) = lookup("VAANI_ASR_BASE_URL") {
            self.speech.base_url = value;
        }
        if let Some(key) = lookup("VAANI_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.speech.api_key = Some(key);
        }
        if let Some(value) = lookup("VAANI_SCHEMES_PATH") {
            self.schemes_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT: {value}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        let threshold = self.agent.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AgentError::Config(format!(
                "confidence_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.agent.required_fields.is_empty() {
            return Err(AgentError::Config(
                "required_fields must not be empty".to_string(),
            ));
        }
        if let Some(unknown) = self
            .agent
            .required_fields
            .iter()
            .find(|f| ProfileField::from_name(f).is_none())
        {
            return Err(AgentError::Config(format!(
                "required field '{unknown}' has no prompt or extractor"
            )));
        }
        if self.agent.max_iterations == Some(0) {
            return Err(AgentError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Catalog file to load, if any.
    pub fn resolved_schemes_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.schemes_path {
            return Some(path.clone());
        }
        let fallback = paths::schemes_file();
        fallback.exists().then_some(fallback)
    }
}
