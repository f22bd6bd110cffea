//! One live connection as seen by the hub.
//!
//! A [`ConnectionHandle`] is shared (via `Arc`) between three parties:
//!
//! - the [`Registry`](crate::application::registry::Registry), which keeps it
//!   eligible for broadcast,
//! - the Hub, which writes to it through [`ConnectionHandle::deliver`],
//! - the Connection Handler, which owns the read half and waits on
//!   [`ConnectionHandle::closed`].
//!
//! Either the Hub (after a write failure) or the handler (after a read failure
//! or shutdown) may decide to tear the connection down.  The lifecycle state is
//! an atomic, and [`ConnectionHandle::close`] claims the `Closing` transition
//! with compare-and-swap, so the sink is closed exactly once no matter who
//! asks first or how often.

use std::sync::atomic::{AtomicU8, Ordering};

use chatroom_core::{ChatMessage, ConnectionId, ConnectionState};
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::application::transport::{MessageSink, TransportError};

/// Shared, close-once wrapper around the write half of a connection.
pub struct ConnectionHandle {
    id: ConnectionId,
    peer: String,
    sink: Mutex<Box<dyn MessageSink>>,
    state: AtomicU8,
    closed_tx: watch::Sender<bool>,
}

impl ConnectionHandle {
    /// Wraps `sink` in a new handle with a fresh [`ConnectionId`].
    ///
    /// `peer` is a human-readable label (usually the remote socket address)
    /// used only in log lines.
    pub fn new(peer: impl Into<String>, sink: Box<dyn MessageSink>) -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            id: ConnectionId::new(),
            peer: peer.into(),
            sink: Mutex::new(sink),
            state: AtomicU8::new(ConnectionState::Accepted.as_u8()),
            closed_tx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        // Only valid discriminants are ever stored.
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
            .unwrap_or(ConnectionState::Closed)
    }

    /// Returns `true` once teardown has begun.
    pub fn is_closed(&self) -> bool {
        self.state().is_terminating()
    }

    /// Moves the handle from `Accepted` to `Registered`.
    ///
    /// Returns `false` if the handle was not in `Accepted` (already registered
    /// once, or already closing).
    pub(crate) fn mark_registered(&self) -> bool {
        self.transition(ConnectionState::Registered).is_some()
    }

    /// Writes one message to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if teardown has begun, or whatever
    /// error the sink reports.  A write still in flight when the handle is
    /// closed is abandoned with [`TransportError::Closed`], which releases the
    /// sink lock for [`ConnectionHandle::close`].
    pub async fn deliver(&self, msg: &ChatMessage) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        // Checked under the sink lock so no write can start after close().
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        tokio::select! {
            biased;
            _ = self.closed() => Err(TransportError::Closed),
            result = sink.send(msg) => result,
        }
    }

    /// Closes the connection's outbound path.
    ///
    /// Only the first call does any work; it returns `true`.  Every later call
    /// (from either side) returns `false` immediately.
    pub async fn close(&self) -> bool {
        if self.transition(ConnectionState::Closing).is_none() {
            return false;
        }

        // Wake the read loop before waiting for an in-flight write.
        self.closed_tx.send_replace(true);

        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.close().await {
            debug!("connection {} ({}): close reported {e}", self.id, self.peer);
        }
        self.state
            .store(ConnectionState::Closed.as_u8(), Ordering::Release);
        true
    }

    /// Resolves once the handle has been closed by anyone.
    pub async fn closed(&self) {
        let mut rx = self.closed_tx.subscribe();
        // The sender lives in `self`, so this cannot fail while we are borrowed.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Attempts one legal transition into `next`, returning the previous state.
    fn transition(&self, next: ConnectionState) -> Option<ConnectionState> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let state = ConnectionState::from_u8(current)?;
            if state == next || !state.can_transition_to(next) {
                return None;
            }
            match self.state.compare_exchange_weak(
                current,
                next.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(state),
                Err(actual) => current = actual,
            }
        }
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .field("state", &self.state())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
