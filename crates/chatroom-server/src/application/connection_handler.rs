//! Connection Handler: the per-connection read loop.
//!
//! One handler runs in its own task for every upgraded connection.  It
//!
//! 1. registers the connection with the hub,
//! 2. reads messages from the peer and enqueues each for broadcast,
//! 3. on any exit (read failure, peer close, shutdown, or a close initiated
//!    by the hub after a failed write) unregisters and closes the connection.
//!
//! Teardown goes through [`ConnectionHandle::close`], so it happens once even
//! when the hub and the handler race to do it.  Read failures are logged here
//! and never propagated.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::connection::ConnectionHandle;
use crate::application::hub::HubHandle;
use crate::application::shutdown::ShutdownSignal;
use crate::application::transport::{MessageSink, MessageSource, TransportError};

/// Why a connection's read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed the stream.
    PeerClosed,
    /// Reading or decoding a frame failed.
    ReadFailed,
    /// The process is shutting down.
    Shutdown,
    /// The hub closed the connection after a failed write.
    ClosedByHub,
    /// The dispatch loop stopped, so nothing could be enqueued.
    HubClosed,
    /// The connection could not be registered.
    RegistrationFailed,
}

/// Runs the full lifecycle of one connection and reports how it ended.
pub async fn handle_connection<R, W>(
    mut source: R,
    sink: W,
    peer: impl Into<String>,
    hub: HubHandle,
    shutdown: ShutdownSignal,
) -> SessionEnd
where
    R: MessageSource,
    W: MessageSink + 'static,
{
    let handle = Arc::new(ConnectionHandle::new(peer, Box::new(sink)));
    let id = handle.id();

    if let Err(e) = hub.register(Arc::clone(&handle)).await {
        warn!("connection {id} ({}): registration failed: {e}", handle.peer());
        handle.close().await;
        return SessionEnd::RegistrationFailed;
    }
    info!("connection {id} ({}) joined", handle.peer());

    let end = loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break SessionEnd::Shutdown,
            _ = handle.closed() => break SessionEnd::ClosedByHub,
            result = source.recv() => match result {
                Ok(msg) => {
                    debug!("connection {id}: received {} byte body", msg.body.len());
                    if hub.publish(msg).is_err() {
                        break SessionEnd::HubClosed;
                    }
                }
                Err(TransportError::Closed) => break SessionEnd::PeerClosed,
                Err(e) => {
                    warn!("connection {id} ({}): read failed: {e}", handle.peer());
                    break SessionEnd::ReadFailed;
                }
            },
        }
    };

    hub.unregister(id).await;
    handle.close().await;
    info!("connection {id} ({}) left: {end:?}", handle.peer());
    end
}

// ── Tests ─────────────────────────────────────────────────────────────────────
