//! Terminal chat client.
//!
//! Entry point: loads configuration, checks the backend, then runs either a
//! single turn (`--message`) or the interactive prompt.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::io::{BufReader, stdin, stdout};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use chat_stream_client::config::{AppConfig, Cli, LogFormat, LoggingConfig};
use chat_stream_client::ui::chat::ChatShell;
use chat_stream_client::{ChatSession, Conversation, HttpChatClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli).context("Configuration error")?;

    init_tracing(&config.logging);

    info!(
        name: "config.loaded",
        base_url = %config.backend.base_url,
        thread_id = %config.conversation.initial_thread_id,
        "Configuration loaded"
    );

    let client = HttpChatClient::new(&config.backend).context("Invalid backend URL")?;

    match client.health().await {
        Ok(health) if health.is_healthy() => {
            info!(name: "backend.healthy", message = %health.message, "Backend is up");
        }
        Ok(health) => {
            warn!(name: "backend.unhealthy", status = %health.status, "Backend reported a problem");
        }
        Err(e) => {
            warn!(name: "backend.unreachable", error = %e, "Backend health check failed");
        }
    }

    let conversation = Conversation::new(&config.conversation.initial_thread_id);
    let shell = ChatShell::new(ChatSession::new(conversation, client), !cli.no_stream);

    if let Some(message) = &cli.message {
        let ok = shell.run_once(message, stdout()).await?;
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    shell.run(BufReader::new(stdin()), stdout()).await?;
    Ok(())
}

/// Initialize tracing (M-LOG-STRUCTURED). Logs go to stderr so they never mix
/// with the transcript on stdout.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}
