//! Command line and layered configuration.
//!
//! Priority, lowest to highest: built-in defaults, config file
//! (`--config` / `CONFIG_FILE`, else `./config.yaml` when present),
//! `CHAT_`-prefixed environment variables (`CHAT_BACKEND__BASE_URL`), and
//! finally command line flags.

use std::path::Path;

use clap::{Parser, ValueEnum};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "Terminal chat client for a streaming chat backend", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Backend base URL
    #[arg(long, env = "CHAT_BASE_URL")]
    pub base_url: Option<String>,

    /// Thread identifier to start on
    #[arg(long, env = "CHAT_THREAD_ID")]
    pub thread_id: Option<String>,

    /// Log output format
    #[arg(long, value_enum, env = "CHAT_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Send a single message, print the reply and exit
    #[arg(short, long, value_parser = non_blank)]
    pub message: Option<String>,

    /// Use the non-streaming endpoint
    #[arg(long)]
    pub no_stream: bool,
}

fn non_blank(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("message is empty, nothing to send".to_string());
    }
    Ok(value.to_string())
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub conversation: ConversationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub stream_path: String,
    pub chat_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            stream_path: "/chat/stream".to_string(),
            chat_path: "/chat".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConversationConfig {
    pub initial_thread_id: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let backend = BackendConfig::default();

        // 1. Defaults
        let mut builder = Config::builder()
            .set_default("backend.base_url", backend.base_url)?
            .set_default("backend.stream_path", backend.stream_path)?
            .set_default("backend.chat_path", backend.chat_path)?
            .set_default("conversation.initial_thread_id", "default")?
            .set_default("logging.format", LogFormat::default().as_str())?
            .set_default("logging.filter", "warn")?;

        // 2. Config file
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
        }

        // 3. Environment, e.g. CHAT_BACKEND__BASE_URL=http://host:8000
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (clap already folded in their own env vars)
        if let Some(url) = &cli.base_url {
            builder = builder.set_override("backend.base_url", url.as_str())?;
        }
        if let Some(thread_id) = &cli.thread_id {
            builder = builder.set_override("conversation.initial_thread_id", thread_id.as_str())?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("logging.format", format.as_str())?;
        }

        let cfg = builder.build()?;
        let config: Self = cfg.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "backend.base_url cannot be empty".to_string(),
            ));
        }
        if self.conversation.initial_thread_id.trim().is_empty() {
            return Err(ConfigError::Message(
                "conversation.initial_thread_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "chat-stream-client",
            "--base-url",
            "http://example.test",
            "--log-format",
            "json",
            "-m",
            "Hello",
            "--no-stream",
        ])
        .unwrap();

        assert_eq!(cli.base_url.as_deref(), Some("http://example.test"));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.message.as_deref(), Some("Hello"));
        assert!(cli.no_stream);
    }

    #[test]
    fn test_blank_message_rejected() {
        let err = Cli::try_parse_from(["chat-stream-client", "-m", "   "]).unwrap_err();
        assert!(err.to_string().contains("nothing to send"));

        let cli = Cli::try_parse_from(["chat-stream-client", "-m", " Hello "]).unwrap();
        assert_eq!(cli.message.as_deref(), Some(" Hello "));
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
