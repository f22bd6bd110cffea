//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from defaults, an optional config file, and
//! CLI/environment overrides, then shared with the accept loop and the hub.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 8000;

/// Default request path for the WebSocket upgrade.
pub const DEFAULT_WS_PATH: &str = "/ws";

/// Default per-write timeout applied to every broadcast write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// A configuration value that passed parsing but cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("WebSocket path must start with '/', got {0:?}")]
    InvalidWsPath(String),

    #[error("maximum message size must be greater than zero")]
    ZeroMessageSize,
}

/// All runtime configuration for the chatroom server.
///
/// # Example
///
/// ```rust
/// use chatroom_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8000);
/// assert_eq!(cfg.ws_path, "/ws");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address and port the listener binds to.
    pub bind_addr: SocketAddr,

    /// Request path that is upgraded to a WebSocket.  Any other path is
    /// answered with `404 Not Found`.
    pub ws_path: String,

    /// Upper bound on a single broadcast write.  A write that takes longer is
    /// treated as a write failure and the recipient is dropped.  `None`
    /// disables the bound.
    pub write_timeout: Option<Duration>,

    /// Browser origins allowed to open a WebSocket.  Empty means every origin
    /// (and requests without an `Origin` header) is accepted.
    pub allowed_origins: Vec<String>,

    /// Largest inbound WebSocket message accepted, in bytes.  `None` keeps the
    /// WebSocket library default.
    pub max_message_size: Option<usize>,
}

impl Default for ServerConfig {
    /// | Field            | Default        |
    /// |------------------|----------------|
    /// | bind_addr        | `0.0.0.0:8000` |
    /// | ws_path          | `/ws`          |
    /// | write_timeout    | 10 seconds     |
    /// | allowed_origins  | empty (any)    |
    /// | max_message_size | library default|
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            ws_path: DEFAULT_WS_PATH.to_string(),
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
            allowed_origins: Vec::new(),
            max_message_size: None,
        }
    }
}

impl ServerConfig {
    /// Checks values that parse fine but cannot be served.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigValidationError`] if the WebSocket path does not start
    /// with `/` or the maximum message size is zero.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.ws_path.starts_with('/') {
            return Err(ConfigValidationError::InvalidWsPath(self.ws_path.clone()));
        }
        if self.max_message_size == Some(0) {
            return Err(ConfigValidationError::ZeroMessageSize);
        }
        Ok(())
    }

    /// Returns `true` if `origin` may open a WebSocket under this config.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => self
                .allowed_origins
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(origin)),
            None => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
