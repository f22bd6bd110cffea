//! chatroom-server: WebSocket broadcast hub entry point.
//!
//! Every JSON message a connected client sends is written back out to every
//! connected client, the sender included.
//!
//! # Usage
//!
//! ```text
//! chatroom-server [OPTIONS]
//!
//! Options:
//!   --config <PATH>              TOML config file
//!   --bind <IP>                  Listen address [default: 0.0.0.0]
//!   --port <PORT>                Listen port [default: 8000]
//!   --ws-path <PATH>             WebSocket request path [default: /ws]
//!   --write-timeout-ms <MS>      Per-write timeout, 0 disables [default: 10000]
//!   --allowed-origins <LIST>     Comma-separated origin allow-list [default: any]
//!   --max-message-bytes <BYTES>  Largest inbound message [default: library default]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                     | Flag                  |
//! |------------------------------|-----------------------|
//! | `CHATROOM_CONFIG`            | `--config`            |
//! | `CHATROOM_BIND`              | `--bind`              |
//! | `CHATROOM_PORT`              | `--port`              |
//! | `CHATROOM_WS_PATH`           | `--ws-path`           |
//! | `CHATROOM_WRITE_TIMEOUT_MS`  | `--write-timeout-ms`  |
//! | `CHATROOM_ALLOWED_ORIGINS`   | `--allowed-origins`   |
//! | `CHATROOM_MAX_MESSAGE_BYTES` | `--max-message-bytes` |
//!
//! Precedence is flag, then environment variable, then config file, then the
//! built-in default.  Logging honours `RUST_LOG`, falling back to the config
//! file's `logging.level`, then `info`.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chatroom_server::application::shutdown_channel;
use chatroom_server::domain::ServerConfig;
use chatroom_server::infrastructure::run_server;
use chatroom_server::infrastructure::storage::config::write_timeout_from_millis;
use chatroom_server::infrastructure::storage::{load_config, FileConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket chat room broadcast hub.
///
/// Every option is optional; anything left unset comes from the config file
/// or the built-in default.
#[derive(Debug, Default, Parser)]
#[command(
    name = "chatroom-server",
    about = "WebSocket broadcast hub for a multi-user chat room",
    version
)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, env = "CHATROOM_CONFIG")]
    config: Option<PathBuf>,

    /// IP address to bind.  `0.0.0.0` accepts connections on every interface.
    #[arg(long, env = "CHATROOM_BIND")]
    bind: Option<String>,

    /// TCP port to listen on.
    #[arg(long, env = "CHATROOM_PORT")]
    port: Option<u16>,

    /// Request path that is upgraded to a WebSocket.
    #[arg(long, env = "CHATROOM_WS_PATH")]
    ws_path: Option<String>,

    /// Per-write timeout in milliseconds.  A recipient whose write takes
    /// longer is dropped.  `0` disables the timeout.
    #[arg(long, env = "CHATROOM_WRITE_TIMEOUT_MS")]
    write_timeout_ms: Option<u64>,

    /// Comma-separated list of allowed browser origins.  Unset means any.
    #[arg(long, env = "CHATROOM_ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Largest inbound WebSocket message in bytes.
    #[arg(long, env = "CHATROOM_MAX_MESSAGE_BYTES")]
    max_message_bytes: Option<usize>,
}

impl Cli {
    /// Loads the config file named by `--config`, or the defaults.
    fn load_file_config(&self) -> anyhow::Result<FileConfig> {
        match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display())),
            None => Ok(FileConfig::default()),
        }
    }

    /// Overlays the CLI/env values on top of `file` to produce the final
    /// [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if a bind address (from either source) is not an IP
    /// address, or if the merged configuration is invalid.
    fn into_server_config(self, file: &FileConfig) -> anyhow::Result<ServerConfig> {
        let mut config = file.server_config().context("invalid [server] section")?;

        if self.bind.is_some() || self.port.is_some() {
            let ip: IpAddr = match &self.bind {
                Some(bind) => bind
                    .parse()
                    .with_context(|| format!("invalid bind address: '{bind}'"))?,
                None => config.bind_addr.ip(),
            };
            let port = self.port.unwrap_or(config.bind_addr.port());
            config.bind_addr = SocketAddr::new(ip, port);
        }
        if let Some(ws_path) = self.ws_path {
            config.ws_path = ws_path;
        }
        if let Some(ms) = self.write_timeout_ms {
            config.write_timeout = write_timeout_from_millis(ms);
        }
        if !self.allowed_origins.is_empty() {
            config.allowed_origins = self
                .allowed_origins
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(limit) = self.max_message_bytes {
            config.max_message_size = Some(limit);
        }

        config.validate().context("invalid server configuration")?;
        Ok(config)
    }
}

/// Builds the log filter: `RUST_LOG` first, then the config file level.
fn log_filter(file_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(file_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = cli.load_file_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&file.logging.level))
        .init();

    let config = cli.into_server_config(&file)?;

    info!(
        "chatroom server starting: bind={}, path={}, write_timeout={:?}, origins={}",
        config.bind_addr,
        config.ws_path,
        config.write_timeout,
        if config.allowed_origins.is_empty() {
            "any".to_string()
        } else {
            config.allowed_origins.join(",")
        }
    );

    let (trigger, shutdown) = shutdown_channel();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; initiating graceful shutdown");
                trigger.trigger();
            }
            Err(e) => {
                error!("failed to listen for Ctrl+C signal: {e}");
                // Keep the trigger alive so the server is not shut down.
                std::future::pending::<()>().await;
            }
        }
    });

    run_server(config, shutdown).await?;

    info!("chatroom server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
