//! Connection identity and lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//! Accepted ──► Registered ──► Closing ──► Closed
//!     │                          ▲          │ ▲
//!     └──────────────────────────┘          └─┘
//! ```
//!
//! - `Accepted`: the transport finished the upgrade handshake.
//! - `Registered`: the connection is in the registry and eligible for
//!   broadcast.  While here, the connection handler is reading from it and the
//!   hub may be writing to it at the same time.
//! - `Closing`: one side (the handler after a read failure, or the hub after a
//!   write failure) has claimed the right to release the connection.  Only one
//!   side can win that claim.
//! - `Closed`: resources released.  Re-entering `Closed` is a no-op.

use std::fmt;

use uuid::Uuid;

/// Unique identity of one live connection.
///
/// Used as the registry key.  A fresh random UUID is generated per accepted
/// connection, so two connections never share an id even if they come from
/// the same peer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generates a new random connection id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a connection.
///
/// The `u8` representation lets the server keep the state in an `AtomicU8`
/// and move between states with compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Accepted = 0,
    Registered = 1,
    Closing = 2,
    Closed = 3,
}

impl ConnectionState {
    /// Returns the `u8` discriminant.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a discriminant back into a state.
    ///
    /// Returns `None` for values that do not name a state.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Accepted),
            1 => Some(Self::Registered),
            2 => Some(Self::Closing),
            3 => Some(Self::Closed),
            _ => None,
        }
    }

    /// Returns `true` if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Accepted, Registered)
                | (Accepted, Closing)
                | (Registered, Closing)
                | (Closing, Closed)
                | (Closed, Closed)
        )
    }

    /// Returns `true` once teardown has begun (`Closing` or `Closed`).
    pub fn is_terminating(self) -> bool {
        matches!(self, ConnectionState::Closing | ConnectionState::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Accepted => "accepted",
            ConnectionState::Registered => "registered",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
