//! `vaani ask` - send a recording, retrying while recognition is unsure
//!
//! Flow per attempt:
//! 1. POST the audio to `/api/transcribe`
//! 2. Low confidence: show the clarify prompt, then re-record, retry, or ask
//! 3. Otherwise POST the transcript to `/api/agent` and return its reply

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const AUTO_RETRY_PAUSE: Duration = Duration::from_millis(200);
const OUT_PLACEHOLDER: &str = "{out}";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TranscribeReply {
    pub text: String,
    pub confidence: f64,
    pub low_confidence: bool,
    pub clarify_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentReply {
    pub session_id: String,
    pub status: String,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub audio: Option<String>,
    #[serde(default)]
    pub application_id: Option<String>,
}

/// The two server calls the flow needs.
#[async_trait]
pub trait VoiceApi: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<TranscribeReply>;

    async fn agent(
        &self,
        transcript: &str,
        confidence: f64,
        session_id: Option<&str>,
    ) -> Result<AgentReply>;
}

#[async_trait]
pub trait Recorder: Send + Sync {
    /// Record a fresh clip and return its path.
    async fn record(&self) -> Result<PathBuf>;
}

/// reqwest client for a running `vaani serve`.
pub struct HttpVoiceApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpVoiceApi {
    pub fn new(server: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: server.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct AgentPayload<'a> {
    transcript: &'a str,
    confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[async_trait]
impl VoiceApi for HttpVoiceApi {
    async fn transcribe(&self, audio: &Path) -> Result<TranscribeReply> {
        let bytes = tokio::fs::read(audio)
            .await
            .with_context(|| format!("Failed to read {}", audio.display()))?;
        let file_name = audio
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name));

        self.http
            .post(format!("{}/api/transcribe", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("Failed to reach /api/transcribe")?
            .error_for_status()
            .context("Transcription failed")?
            .json()
            .await
            .context("Failed to parse transcription reply")
    }

    async fn agent(
        &self,
        transcript: &str,
        confidence: f64,
        session_id: Option<&str>,
    ) -> Result<AgentReply> {
        self.http
            .post(format!("{}/api/agent", self.base_url))
            .json(&AgentPayload {
                transcript,
                confidence,
                session_id,
            })
            .send()
            .await
            .context("Failed to reach /api/agent")?
            .error_for_status()
            .context("Agent call failed")?
            .json()
            .await
            .context("Failed to parse agent reply")
    }
}

/// Runs an external recorder command.
///
/// `{out}` in the command is replaced by a fresh temp `.wav` path; without
/// the placeholder the path is appended as the last argument.
pub struct CommandRecorder {
    argv: Vec<String>,
}

impl CommandRecorder {
    pub fn new(command: &str) -> Result<Self> {
        let argv = shell_words::split(command)
            .with_context(|| format!("Invalid record command: {}", command))?;
        if argv.is_empty() {
            anyhow::bail!("Record command is empty");
        }
        Ok(Self { argv })
    }

    fn command_for(&self, out: &Path) -> Vec<String> {
        let out = out.display().to_string();
        let mut argv: Vec<String> = self
            .argv
            .iter()
            .map(|arg| arg.replace(OUT_PLACEHOLDER, &out))
            .collect();
        if !self.argv.iter().any(|arg| arg.contains(OUT_PLACEHOLDER)) {
            argv.push(out);
        }
        argv
    }
}

#[async_trait]
impl Recorder for CommandRecorder {
    async fn record(&self) -> Result<PathBuf> {
        let out = std::env::temp_dir()
            .join(format!("vaani-{}.wav", uuid::Uuid::new_v4().simple()));
        let argv = self.command_for(&out);
        tracing::debug!(?argv, "Running recorder");

        let status = tokio::process::Command::new(&argv[0])
            .args(&argv[1..])
            .status()
            .await
            .with_context(|| format!("Failed to run recorder {}", argv[0]))?;
        if !status.success() {
            anyhow::bail!("Recorder exited with {}", status);
        }
        if !out.exists() {
            anyhow::bail!("Recorder did not write {}", out.display());
        }
        Ok(out)
    }
}

/// What to do after a low-confidence transcription.
pub enum RetryMode {
    /// Ask on stdin: Enter retries the same file, `r` aborts.
    Interactive,
    /// Retry the same file after a short pause.
    Automatic,
    /// Record a new clip and retry with it.
    Record(Box<dyn Recorder>),
}

pub struct RetryClient<A> {
    api: A,
    max_retries: usize,
    mode: RetryMode,
    threshold: Option<f64>,
}

impl<A: VoiceApi> RetryClient<A> {
    pub fn new(api: A, max_retries: usize, mode: RetryMode) -> Self {
        Self {
            api,
            max_retries,
            mode,
            threshold: None,
        }
    }

    /// Also treat transcriptions below `threshold` as unclear, on top of
    /// the server's own flag.
    pub fn with_threshold(mut self, threshold: Option<f64>) -> Self {
        self.threshold = threshold;
        self
    }

    fn is_low(&self, transcription: &TranscribeReply) -> bool {
        transcription.low_confidence
            || self
                .threshold
                .is_some_and(|t| transcription.confidence < t)
    }

    /// Run transcribe -> agent, retrying low-confidence attempts.
    ///
    /// Returns `None` when retries run out or the user aborts.
    pub async fn run_flow(
        &self,
        audio: &Path,
        session_id: Option<&str>,
    ) -> Result<Option<AgentReply>> {
        let mut audio = audio.to_path_buf();
        // Clips we recorded ourselves are deleted once transcribed.
        let mut recorded = false;

        for attempt in 1..=self.max_retries {
            println!("Attempt {}: sending {}", attempt, audio.display());
            let transcription = self.api.transcribe(&audio).await;
            if recorded {
                discard_clip(&audio).await;
            }
            let transcription = transcription?;
            tracing::debug!(?transcription, "Transcription");

            if !self.is_low(&transcription) {
                println!(
                    "Heard: {} (confidence {:.2})",
                    transcription.text, transcription.confidence
                );
                let reply = self
                    .api
                    .agent(&transcription.text, transcription.confidence, session_id)
                    .await?;
                return Ok(Some(reply));
            }

            let prompt = transcription
                .clarify_prompt
                .as_deref()
                .unwrap_or("I couldn't understand, please repeat.");
            println!("Low confidence ({:.2}): {}", transcription.confidence, prompt);
            if attempt == self.max_retries {
                break;
            }

            match &self.mode {
                RetryMode::Record(recorder) => {
                    audio = recorder.record().await?;
                    recorded = true;
                    println!("Re-recorded audio -> {}", audio.display());
                }
                RetryMode::Automatic => tokio::time::sleep(AUTO_RETRY_PAUSE).await,
                RetryMode::Interactive => {
                    if !confirm_retry().await? {
                        println!("Aborted. Re-run with a new recording.");
                        return Ok(None);
                    }
                }
            }
        }

        println!("Max retries reached; aborting.");
        Ok(None)
    }
}

async fn discard_clip(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!(path = %path.display(), "Failed to remove recorded clip: {}", e);
    }
}

async fn confirm_retry() -> Result<bool> {
    let answer = tokio::task::spawn_blocking(|| -> io::Result<String> {
        print!("Press Enter to retry with the same file, or 'r' to stop: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line)
    })
    .await
    .context("Prompt task failed")??;
    Ok(answer.trim().to_lowercase() != "r")
}

/// Print an agent reply for the terminal.
pub fn print_reply(reply: &AgentReply) {
    println!();
    println!("  Session: {}", reply.session_id);
    println!("  Status:  {}", reply.status);
    if let Some(text) = &reply.reply {
        println!("  Reply:   {}", text);
    }
    if let Some(id) = &reply.application_id {
        println!("  Application: {}", id);
    }
    if let Some(audio) = &reply.audio {
        println!("  Audio:   {}", audio);
    }
}
