//! Vaani - voice assistant for welfare scheme applications
//!
//! - `vaani serve` - HTTP API (transcribe, agent, speak, schemes, sessions)
//! - `vaani ask` - send a recording to a running server, retrying unclear audio

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod retry;
mod serve;

use retry::{CommandRecorder, HttpVoiceApi, RetryClient, RetryMode};

/// Vaani - voice assistant
#[derive(Parser)]
#[command(name = "vaani")]
#[command(about = "Telugu voice assistant for welfare scheme applications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Vaani API server
    ///
    /// Reads ~/.vaani/config.toml and VAANI_* environment overrides.
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send a recording to a running server and print the agent's reply
    ///
    /// Low-confidence transcriptions are retried: by re-recording when a
    /// record command is given, immediately with --auto-retry, or after
    /// asking on the terminal.
    Ask {
        /// Audio file (wav/mp3/webm)
        audio: PathBuf,

        /// Server base URL
        #[arg(long, default_value = "http://localhost:8000")]
        server: String,

        /// Maximum transcription attempts
        #[arg(long, default_value_t = 3)]
        retries: usize,

        /// Retry the same file without asking
        #[arg(long)]
        auto_retry: bool,

        /// Command that records a new clip; `{out}` is replaced by the output path
        #[arg(long)]
        record_command: Option<String>,

        /// Continue an existing conversation
        #[arg(long)]
        session_id: Option<String>,

        /// Treat confidence below this as unclear, in addition to the server's flag
        #[arg(long)]
        confidence_threshold: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => serve::run(port).await,
        Commands::Ask {
            audio,
            server,
            retries,
            auto_retry,
            record_command,
            session_id,
            confidence_threshold,
        } => {
            // Client mode logs only warnings unless RUST_LOG says otherwise
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::WARN.into()),
                )
                .with_writer(std::io::stderr)
                .init();

            let mode = match record_command {
                Some(command) => RetryMode::Record(Box::new(CommandRecorder::new(&command)?)),
                None if auto_retry => RetryMode::Automatic,
                None => RetryMode::Interactive,
            };
            let client = RetryClient::new(HttpVoiceApi::new(&server)?, retries, mode)
                .with_threshold(confidence_threshold);

            if let Some(reply) = client.run_flow(&audio, session_id.as_deref()).await? {
                retry::print_reply(&reply);
            }
            Ok(())
        }
    }
}
