//! TOML configuration file for the chatroom server.
//!
//! The file is optional and passed with `--config <path>`.  Every field has a
//! default, so a file only needs the values it changes:
//!
//! ```toml
//! [server]
//! bind_address = "127.0.0.1"
//! port = 9000
//! ws_path = "/ws"
//! write_timeout_ms = 5000      # 0 disables the per-write timeout
//! allowed_origins = ["http://localhost:9000"]
//! max_message_bytes = 65536
//!
//! [logging]
//! level = "debug"              # used when RUST_LOG is not set
//! ```
//!
//! CLI flags and environment variables override whatever the file says.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{ServerConfig, DEFAULT_PORT, DEFAULT_WRITE_TIMEOUT, DEFAULT_WS_PATH};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `server.bind_address` is not an IP address.
    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level layout of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSection {
    /// IP address to bind.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Per-write timeout in milliseconds; `0` disables it.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_message_bytes: Option<usize>,
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSection {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_ws_path() -> String {
    DEFAULT_WS_PATH.to_string()
}
fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT.as_millis() as u64
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            ws_path: default_ws_path(),
            write_timeout_ms: default_write_timeout_ms(),
            allowed_origins: Vec::new(),
            max_message_bytes: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl FileConfig {
    /// Converts the `[server]` section into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] if `bind_address` is not an
    /// IP address.
    pub fn server_config(&self) -> Result<ServerConfig, ConfigError> {
        let s = &self.server;
        let ip: IpAddr = s
            .bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(s.bind_address.clone()))?;
        Ok(ServerConfig {
            bind_addr: SocketAddr::new(ip, s.port),
            ws_path: s.ws_path.clone(),
            write_timeout: write_timeout_from_millis(s.write_timeout_ms),
            allowed_origins: s.allowed_origins.clone(),
            max_message_size: s.max_message_bytes,
        })
    }
}

/// Maps a millisecond setting to a timeout, where `0` means "no timeout".
pub fn write_timeout_from_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses config file content.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Loads the config file at `path`.
///
/// The path was given explicitly, so a missing file is an error.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_file_config_default_matches_server_config_default() {
        let cfg = FileConfig::default().server_config().unwrap();
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn test_logging_default_level_is_info() {
        assert_eq!(FileConfig::default().logging.level, "info");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, FileConfig::default());
    }

    #[test]
    fn test_partial_server_section_overrides_only_given_fields() {
        // Arrange
        let toml_str = r#"
            [server]
            port = 9000
        "#;

        // Act
        let cfg = parse_config(toml_str).unwrap();

        // Assert
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.server.ws_path, "/ws");
        assert_eq!(cfg.server.write_timeout_ms, 10_000);
    }

    #[test]
    fn test_full_file_converts_to_server_config() {
        let toml_str = r#"
            [server]
            bind_address = "127.0.0.1"
            port = 9100
            ws_path = "/chat"
            write_timeout_ms = 2500
            allowed_origins = ["http://localhost:9100"]
            max_message_bytes = 4096

            [logging]
            level = "debug"
        "#;

        let file = parse_config(toml_str).unwrap();
        let cfg = file.server_config().unwrap();

        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:9100");
        assert_eq!(cfg.ws_path, "/chat");
        assert_eq!(cfg.write_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(cfg.allowed_origins, vec!["http://localhost:9100"]);
        assert_eq!(cfg.max_message_size, Some(4096));
        assert_eq!(file.logging.level, "debug");
    }

    #[test]
    fn test_zero_write_timeout_disables_timeout() {
        let file = parse_config("[server]\nwrite_timeout_ms = 0\n").unwrap();
        assert_eq!(file.server_config().unwrap().write_timeout, None);
    }

    #[test]
    fn test_invalid_bind_address_is_rejected() {
        let file = parse_config("[server]\nbind_address = \"not.an.ip\"\n").unwrap();
        let result = file.server_config();
        assert!(matches!(result, Err(ConfigError::InvalidBindAddress(_))));
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result = parse_config("[server\nport = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_wrong_type_returns_parse_error() {
        let result = parse_config("[server]\nport = \"eight thousand\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("chatroom_missing_{}.toml", Uuid::new_v4()));
        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_config_reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("chatroom_test_{}.toml", Uuid::new_v4()));
        std::fs::write(&path, "[server]\nport = 8123\n").unwrap();

        let result = load_config(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(result.unwrap().server.port, 8123);
    }

    #[test]
    fn test_file_config_serializes_back_to_toml() {
        let cfg = FileConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert_eq!(parse_config(&text).unwrap(), cfg);
    }
}
