//! Infrastructure layer for chatroom-server.
//!
//! The infrastructure layer handles all I/O.
//!
//! # Responsibilities
//!
//! - Binding the TCP listener and running the accept loop
//! - Performing the WebSocket upgrade and enforcing the upgrade policy
//! - Adapting WebSocket streams to the application's transport traits
//! - Loading the TOML configuration file
//! - Providing an in-memory transport for tests
//!
//! # What does NOT belong here?
//!
//! - Broadcast, registration, or teardown rules (application layer)
//! - The message schema and its JSON encoding (chatroom-core)

pub mod mock_transport;
pub mod storage;
pub mod ws_server;
pub mod ws_transport;

pub use ws_server::{run_server, serve, UpgradePolicy, UpgradeRejection};
