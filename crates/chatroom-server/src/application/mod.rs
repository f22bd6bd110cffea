//! Application layer for chatroom-server.
//!
//! This is the broadcast hub proper.  It knows *what* happens to a message
//! (enqueue, fan out, drop failed recipients) but not how bytes reach a
//! socket; that is behind the [`transport`] traits.
//!
//! # Responsibilities
//!
//! - [`registry`]: the lock-guarded set of live connections
//! - [`connection`]: per-connection handle with close-once semantics
//! - [`hub`]: inbound FIFO queue and the single dispatch loop
//! - [`connection_handler`]: per-connection read loop
//! - [`shutdown`]: cooperative cancellation signal
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or performing the WebSocket upgrade (infrastructure)
//! - JSON framing (chatroom-core codec, called from the transport adapters)

pub mod connection;
pub mod connection_handler;
pub mod hub;
pub mod registry;
pub mod shutdown;
pub mod transport;

pub use connection::ConnectionHandle;
pub use connection_handler::{handle_connection, SessionEnd};
pub use hub::{BroadcastReport, DispatchStats, Hub, HubConfig, HubError, HubHandle};
pub use registry::{Registry, RegistryError};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use transport::{MessageSink, MessageSource, TransportError};
