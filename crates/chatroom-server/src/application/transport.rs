//! Transport seam between the hub and the wire.
//!
//! The application layer only ever sees whole [`ChatMessage`] values.  How they
//! are framed, encoded, and carried is the business of whatever implements
//! these traits: the WebSocket adapters in `infrastructure::ws_transport` in
//! production, and `infrastructure::mock_transport` in tests.
//!
//! A connection is split into two halves so the Connection Handler can read
//! while the Hub writes:
//!
//! - [`MessageSource`] is owned by the Connection Handler's read loop.
//! - [`MessageSink`] is owned by the connection's
//!   [`ConnectionHandle`](crate::application::connection::ConnectionHandle)
//!   and written to by the Hub.

use async_trait::async_trait;
use chatroom_core::{ChatMessage, ProtocolError};
use thiserror::Error;

/// Errors produced by a transport half.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer ended the stream, or the connection was already closed.
    #[error("connection closed")]
    Closed,

    /// A write did not complete within the configured per-write timeout.
    #[error("write timed out")]
    TimedOut,

    /// A frame arrived but did not contain a valid chat message.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// The read half of a connection.
#[async_trait]
pub trait MessageSource: Send {
    /// Waits for the next complete message from the peer.
    ///
    /// Returns `Err(TransportError::Closed)` once the peer has ended the
    /// stream.  Any other error is a read failure.  Implementations must be
    /// cancel-safe: dropping the future before it resolves loses no message.
    async fn recv(&mut self) -> Result<ChatMessage, TransportError>;
}

/// The write half of a connection.
#[async_trait]
pub trait MessageSink: Send {
    /// Writes one message to the peer.
    async fn send(&mut self, msg: &ChatMessage) -> Result<(), TransportError>;

    /// Closes the outbound path.  Called at most once per connection by
    /// [`ConnectionHandle::close`](crate::application::connection::ConnectionHandle::close).
    async fn close(&mut self) -> Result<(), TransportError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
