//! `vaani serve` - run the HTTP API
//!
//! Loads `~/.vaani/config.toml` plus environment overrides, then starts the
//! server and shuts down on ctrl+c.

use anyhow::Result;

use vaani_core::config::SpeechProvider;
use vaani_core::VaaniConfig;

/// Run the serve command.
pub async fn run(port: Option<u16>) -> Result<()> {
    // Initialize tracing for server mode (stdout)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut config = VaaniConfig::load()?;
    if let Some(port) = port {
        config.server.port = port;
    }

    print_banner(&config);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let server = vaani_server::start_server(vaani_server::ServerConfig::new(config));

    tokio::select! {
        result = server => {
            result?;
        }
        _ = shutdown_signal => {
            println!("\n  Shutting down...");
        }
    }

    Ok(())
}

fn print_banner(config: &VaaniConfig) {
    let speech = match config.speech.provider {
        SpeechProvider::Http => config.speech.base_url.as_str(),
        SpeechProvider::Disabled => "disabled",
    };
    println!();
    println!("  \x1b[1;36mVaani\x1b[0m server starting");
    println!("  ─────────────────────────────────────");
    println!("  Local:    http://localhost:{}", config.server.port);
    println!("  Language: {}", config.agent.language);
    println!("  Speech:   {}", speech);
    println!();
}
