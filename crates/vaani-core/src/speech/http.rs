//! OpenAI-compatible speech endpoints.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{confidence_from_segments, Segment, SpeechRecognizer, SpeechSynthesizer, Transcription};
use crate::config::SpeechSettings;

/// Shared HTTP plumbing for both adapters.
#[derive(Debug, Clone)]
struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    fn new(settings: &SpeechSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build speech HTTP client")?;
        if settings.api_key.is_none() {
            tracing::warn!(base_url = %settings.base_url, "Speech provider has no API key");
        }
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn post(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let request = self.http.post(format!("{}/{}", self.base_url, endpoint));
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<Segment>,
}

pub struct HttpRecognizer {
    client: ApiClient,
    model: String,
}

impl HttpRecognizer {
    pub fn new(settings: &SpeechSettings) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(settings)?,
            model: settings.asr_model.clone(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for HttpRecognizer {
    async fn recognize(&self, audio: &Path, language: &str) -> Result<Transcription> {
        let bytes = tokio::fs::read(audio)
            .await
            .with_context(|| format!("Failed to read audio {}", audio.display()))?;
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", language.to_string())
            .text("response_format", "verbose_json");

        let response: VerboseTranscription = self
            .client
            .post("audio/transcriptions")
            .multipart(form)
            .send()
            .await
            .context("Failed to send transcription request")?
            .error_for_status()
            .context("Transcription request rejected")?
            .json()
            .await
            .context("Failed to parse transcription response")?;

        let confidence = confidence_from_segments(&response.segments);
        tracing::debug!(
            segments = response.segments.len(),
            confidence,
            "Transcription received"
        );

        Ok(Transcription {
            text: response.text.trim().to_string(),
            confidence,
        })
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

pub struct HttpSynthesizer {
    client: ApiClient,
    model: String,
    voice: String,
}

impl HttpSynthesizer {
    pub fn new(settings: &SpeechSettings) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(settings)?,
            model: settings.tts_model.clone(),
            voice: settings.voice.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(&self, text: &str, language: &str, out_path: &Path) -> Result<PathBuf> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        let audio = self
            .client
            .post("audio/speech")
            .json(&request)
            .send()
            .await
            .context("Failed to send speech request")?
            .error_for_status()
            .context("Speech request rejected")?
            .bytes()
            .await
            .context("Failed to read speech audio")?;

        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(out_path, &audio)
            .await
            .with_context(|| format!("Failed to write {}", out_path.display()))?;

        tracing::debug!(language, bytes = audio.len(), path = %out_path.display(), "Speech synthesized");
        Ok(out_path.to_path_buf())
    }
}
