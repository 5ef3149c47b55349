//! Speech adapters
//!
//! - `SpeechRecognizer` - audio file in, text plus a [0, 1] confidence out
//! - `SpeechSynthesizer` - reply text in, audio file out
//!
//! `HttpRecognizer`/`HttpSynthesizer` talk to an OpenAI-compatible API.
//! The `Disabled*` variants stand in when no provider is configured.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{SpeechProvider, SpeechSettings};

mod http;

pub use http::{HttpRecognizer, HttpSynthesizer};

/// Recognizer output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    /// Normalized to [0, 1].
    pub confidence: f64,
}

/// One recognized segment as reported by the transcription API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub avg_logprob: Option<f64>,
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, audio: &Path, language: &str) -> Result<Transcription>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Write audio for `text` to `out_path` and return the written path.
    async fn synthesize(&self, text: &str, language: &str, out_path: &Path) -> Result<PathBuf>;
}

/// Heuristic confidence: `clamp(1 + mean(avg_logprob), 0, 1)`.
///
/// Segments without a log-probability are skipped. No usable segment
/// means no confidence.
pub fn confidence_from_segments(segments: &[Segment]) -> f64 {
    let logprobs: Vec<f64> = segments.iter().filter_map(|s| s.avg_logprob).collect();
    if logprobs.is_empty() {
        return 0.0;
    }
    let mean = logprobs.iter().sum::<f64>() / logprobs.len() as f64;
    (1.0 + mean).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRecognizer;

#[async_trait]
impl SpeechRecognizer for DisabledRecognizer {
    async fn recognize(&self, _audio: &Path, _language: &str) -> Result<Transcription> {
        Err(SpeechError::NotConfigured("speech recognition").into())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSynthesizer;

#[async_trait]
impl SpeechSynthesizer for DisabledSynthesizer {
    async fn synthesize(&self, _text: &str, _language: &str, _out: &Path) -> Result<PathBuf> {
        Err(SpeechError::NotConfigured("speech synthesis").into())
    }
}

/// True when `err` means the adapter is switched off rather than broken.
pub fn is_not_configured(err: &anyhow::Error) -> bool {
    err.downcast_ref::<SpeechError>()
        .is_some_and(|e| matches!(e, SpeechError::NotConfigured(_)))
}

pub fn build_recognizer(settings: &SpeechSettings) -> Result<Arc<dyn SpeechRecognizer>> {
    match settings.provider {
        SpeechProvider::Http => Ok(Arc::new(HttpRecognizer::new(settings)?)),
        SpeechProvider::Disabled => {
            tracing::info!("Speech recognition disabled");
            Ok(Arc::new(DisabledRecognizer))
        }
    }
}

pub fn build_synthesizer(settings: &SpeechSettings) -> Result<Arc<dyn SpeechSynthesizer>> {
    match settings.provider {
        SpeechProvider::Http => Ok(Arc::new(HttpSynthesizer::new(settings)?)),
        SpeechProvider::Disabled => Ok(Arc::new(DisabledSynthesizer)),
    }
}
