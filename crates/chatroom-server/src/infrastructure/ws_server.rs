//! WebSocket server: accept loop, upgrade policy, and per-connection tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Starting the Hub's dispatch loop.
//! 3. Accepting TCP connections and upgrading each one to a WebSocket, subject
//!    to the [`UpgradePolicy`] (request path and `Origin` checks).
//! 4. Handing each upgraded connection to the Connection Handler in its own
//!    task.
//! 5. Stopping everything when the shutdown signal fires.
//!
//! A failed upgrade only affects that one connection; the accept loop keeps
//! serving.
//!
//! Only the WebSocket path is served.  The chat page and its assets are not:
//! every other path, `/` included, gets `404 Not Found`.  Put a static file
//! server or reverse proxy in front when browsers need the page from the same
//! origin.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{header::ORIGIN, StatusCode};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, error, info, warn};

use crate::application::connection_handler::{handle_connection, SessionEnd};
use crate::application::hub::{DispatchStats, Hub, HubConfig, HubHandle};
use crate::application::shutdown::ShutdownSignal;
use crate::domain::config::ServerConfig;
use crate::infrastructure::ws_transport::split_websocket;

// ── Upgrade policy ────────────────────────────────────────────────────────────

/// Why an upgrade request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeRejection {
    /// The request path is not the WebSocket path.
    NotFound,
    /// An origin allow-list is configured and the request's origin is not on it.
    ForbiddenOrigin,
}

impl UpgradeRejection {
    pub fn status(self) -> StatusCode {
        match self {
            UpgradeRejection::NotFound => StatusCode::NOT_FOUND,
            UpgradeRejection::ForbiddenOrigin => StatusCode::FORBIDDEN,
        }
    }

    fn reason(self) -> &'static str {
        match self {
            UpgradeRejection::NotFound => "not found",
            UpgradeRejection::ForbiddenOrigin => "origin not allowed",
        }
    }
}

/// Decides whether an HTTP upgrade request may become a WebSocket.
#[derive(Debug, Clone)]
pub struct UpgradePolicy {
    config: Arc<ServerConfig>,
}

impl UpgradePolicy {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    /// Checks a request's path and `Origin` header value.
    pub fn evaluate(&self, path: &str, origin: Option<&str>) -> Result<(), UpgradeRejection> {
        if path != self.config.ws_path {
            return Err(UpgradeRejection::NotFound);
        }
        if !self.config.origin_allowed(origin) {
            return Err(UpgradeRejection::ForbiddenOrigin);
        }
        Ok(())
    }

    /// Adapts [`UpgradePolicy::evaluate`] to the tungstenite handshake callback.
    fn check(&self, req: &Request, response: Response) -> Result<Response, ErrorResponse> {
        let origin = req.headers().get(ORIGIN).and_then(|v| v.to_str().ok());
        match self.evaluate(req.uri().path(), origin) {
            Ok(()) => Ok(response),
            Err(rejection) => {
                let mut err = ErrorResponse::new(Some(rejection.reason().to_string()));
                *err.status_mut() = rejection.status();
                Err(err)
            }
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds the configured address and serves until `shutdown` fires.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listener cannot be
/// bound (port in use, missing permission).
pub async fn run_server(config: ServerConfig, shutdown: ShutdownSignal) -> anyhow::Result<()> {
    config.validate().context("invalid server configuration")?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    info!(
        "chatroom listening on ws://{}{}",
        config.bind_addr, config.ws_path
    );

    serve(listener, config, shutdown).await?;
    Ok(())
}

/// Serves WebSocket clients on an already-bound listener.
///
/// Spawns the Hub's dispatch loop, accepts connections until `shutdown`
/// fires, then waits for the hub and every connection task to finish.
///
/// # Errors
///
/// Returns an error if the dispatch task panicked.
pub async fn serve(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: ShutdownSignal,
) -> anyhow::Result<DispatchStats> {
    let config = Arc::new(config);
    let policy = UpgradePolicy::new(Arc::clone(&config));
    let ws_config = websocket_config(&config);

    let (hub, hub_handle) = Hub::new(HubConfig {
        write_timeout: config.write_timeout,
    });
    let hub_task = tokio::spawn(hub.run(shutdown.clone()));

    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => {
                info!("shutdown requested; stopping accept loop");
                break;
            }
            Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    debug!("accepted TCP connection from {peer_addr}");
                    sessions.spawn(run_session(
                        stream,
                        peer_addr,
                        policy.clone(),
                        ws_config,
                        hub_handle.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    // Transient (e.g. too many open files); keep serving.
                    error!("accept error: {e}");
                }
            },
        }
    }

    drop(hub_handle);
    let stats = hub_task.await.context("hub dispatch task failed")?;
    while sessions.join_next().await.is_some() {}

    info!("chatroom server stopped");
    Ok(stats)
}

// ── Per-connection task ───────────────────────────────────────────────────────

/// Upgrades one TCP connection and runs its Connection Handler.
async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    policy: UpgradePolicy,
    ws_config: WebSocketConfig,
    hub: HubHandle,
    shutdown: ShutdownSignal,
) -> Option<SessionEnd> {
    let upgrade = accept_hdr_async_with_config(
        stream,
        move |req: &Request, response: Response| policy.check(req, response),
        Some(ws_config),
    );

    let ws = tokio::select! {
        _ = shutdown.wait() => return None,
        result = upgrade => match result {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocket upgrade from {peer_addr} rejected: {e}");
                return None;
            }
        },
    };

    let (source, sink) = split_websocket(ws);
    Some(handle_connection(source, sink, peer_addr.to_string(), hub, shutdown).await)
}

fn websocket_config(config: &ServerConfig) -> WebSocketConfig {
    let mut ws_config = WebSocketConfig::default();
    if let Some(limit) = config.max_message_size {
        ws_config.max_message_size = Some(limit);
        ws_config.max_frame_size = Some(limit);
    }
    ws_config
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_with(origins: &[&str]) -> UpgradePolicy {
        UpgradePolicy::new(Arc::new(ServerConfig {
            allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            ..ServerConfig::default()
        }))
    }

    #[test]
    fn test_policy_accepts_ws_path_without_origin_when_unrestricted() {
        assert_eq!(policy_with(&[]).evaluate("/ws", None), Ok(()));
    }

    #[test]
    fn test_policy_rejects_other_paths_with_not_found() {
        let policy = policy_with(&[]);
        assert_eq!(policy.evaluate("/", None), Err(UpgradeRejection::NotFound));
        assert_eq!(
            policy.evaluate("/ws/extra", None),
            Err(UpgradeRejection::NotFound)
        );
    }

    #[test]
    fn test_policy_enforces_origin_allow_list() {
        let policy = policy_with(&["http://localhost:8000"]);
        assert_eq!(policy.evaluate("/ws", Some("http://localhost:8000")), Ok(()));
        assert_eq!(
            policy.evaluate("/ws", Some("http://evil.example")),
            Err(UpgradeRejection::ForbiddenOrigin)
        );
        assert_eq!(
            policy.evaluate("/ws", None),
            Err(UpgradeRejection::ForbiddenOrigin)
        );
    }

    #[test]
    fn test_page_routes_are_not_served() {
        let policy = policy_with(&[]);
        for path in ["/", "/index.html", "/static/app.js"] {
            assert_eq!(
                policy.evaluate(path, None),
                Err(UpgradeRejection::NotFound),
                "{path} must not be served"
            );
        }
    }

    #[test]
    fn test_path_is_checked_before_origin() {
        let policy = policy_with(&["http://localhost:8000"]);
        assert_eq!(
            policy.evaluate("/nope", Some("http://evil.example")),
            Err(UpgradeRejection::NotFound)
        );
    }

    #[test]
    fn test_rejection_status_codes() {
        assert_eq!(UpgradeRejection::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            UpgradeRejection::ForbiddenOrigin.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_check_builds_error_response_with_status() {
        let policy = policy_with(&[]);
        let req = Request::builder().uri("/elsewhere").body(()).unwrap();

        let result = policy.check(&req, Response::new(()));

        let err = result.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_websocket_config_applies_size_limit() {
        let cfg = ServerConfig {
            max_message_size: Some(1024),
            ..ServerConfig::default()
        };
        let ws = websocket_config(&cfg);
        assert_eq!(ws.max_message_size, Some(1024));
        assert_eq!(ws.max_frame_size, Some(1024));
    }

    #[test]
    fn test_websocket_config_keeps_library_default_when_unset() {
        let ws = websocket_config(&ServerConfig::default());
        assert_eq!(
            ws.max_message_size,
            WebSocketConfig::default().max_message_size
        );
    }
}
