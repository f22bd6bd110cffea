//! chatroom-server library crate.
//!
//! A broadcast hub for a multi-user chat room: every message received from any
//! connected WebSocket client is written back out to every connected client,
//! the sender included.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browsers / terminal clients  (JSON over WebSocket)
//!         ↕
//! [chatroom-server]
//!   ├── domain/             ServerConfig
//!   ├── application/        Registry, Hub (dispatch loop), Connection Handler,
//!   │                       transport traits, shutdown signal
//!   └── infrastructure/
//!         ├── ws_server     Accept loop + upgrade policy (tokio-tungstenite)
//!         ├── ws_transport  WebSocket adapters for the transport traits
//!         ├── mock_transport In-memory transport for tests
//!         └── storage/      TOML config file loading
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain`, `chatroom-core`, and the transport
//!   traits it defines; it never names a socket or a WebSocket type.
//! - `infrastructure` depends on all other layers plus `tokio-tungstenite`.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: registry, hub, connection handler.
pub mod application;

/// Infrastructure layer: WebSocket server, transports, config file.
pub mod infrastructure;
