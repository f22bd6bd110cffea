//! The Hub: inbound queue plus dispatch loop.
//!
//! Every Connection Handler pushes decoded messages into one shared FIFO
//! queue through a [`HubHandle`].  A single dispatch task ([`Hub::run`]) pops
//! them in order and writes each one to every registered connection, the
//! sender included.
//!
//! # Ordering
//!
//! Broadcasts run one at a time in dequeue order, and within one broadcast the
//! writes are sequential.  So if message A is dequeued before B, every
//! connection that receives both receives A first.  A slow recipient delays
//! the ones after it; the optional per-write timeout bounds that delay.
//!
//! # Failure handling
//!
//! A failed or timed-out write removes that one recipient from the registry,
//! closes it, and the fan-out carries on with the next.  Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use chatroom_core::{ChatMessage, ConnectionId};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::connection::ConnectionHandle;
use crate::application::registry::{Registry, RegistryError};
use crate::application::shutdown::ShutdownSignal;
use crate::application::transport::TransportError;
use crate::domain::config::DEFAULT_WRITE_TIMEOUT;

/// Errors returned by [`HubHandle::publish`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// The dispatch loop has stopped; nothing more will be delivered.
    #[error("hub dispatch loop has stopped")]
    Closed,
}

/// Tuning for the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Upper bound on each individual write.  `None` waits forever.
    pub write_timeout: Option<Duration>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            write_timeout: Some(DEFAULT_WRITE_TIMEOUT),
        }
    }
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients the message was written to.
    pub delivered: usize,
    /// Recipients dropped because their write failed or timed out.
    pub dropped: usize,
}

/// Totals accumulated by [`Hub::run`] over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Messages taken off the queue.
    pub messages: u64,
    /// Successful writes across all broadcasts.
    pub deliveries: u64,
    /// Recipients dropped across all broadcasts.
    pub drops: u64,
}

/// Owner of the inbound queue's receiving end and the dispatch loop.
pub struct Hub {
    registry: Arc<Registry>,
    inbound: mpsc::UnboundedReceiver<ChatMessage>,
    config: HubConfig,
}

/// Cloneable handle given to every Connection Handler.
#[derive(Debug, Clone)]
pub struct HubHandle {
    registry: Arc<Registry>,
    inbound: mpsc::UnboundedSender<ChatMessage>,
}

impl Hub {
    /// Creates a hub with an empty registry and an empty queue.
    ///
    /// The queue stays open as long as any [`HubHandle`] is alive.
    pub fn new(config: HubConfig) -> (Self, HubHandle) {
        let registry = Arc::new(Registry::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Self {
            registry: Arc::clone(&registry),
            inbound: rx,
            config,
        };
        let handle = HubHandle {
            registry,
            inbound: tx,
        };
        (hub, handle)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Runs the dispatch loop.
    ///
    /// Takes messages off the queue (suspending while it is empty) and
    /// broadcasts each one.  Returns when `shutdown` fires (abandoning any
    /// broadcast in progress) or when every [`HubHandle`] has been dropped.  Any connections still registered at
    /// that point are unregistered and closed.
    pub async fn run(mut self, shutdown: ShutdownSignal) -> DispatchStats {
        let mut stats = DispatchStats::default();

        loop {
            let msg = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("hub: shutdown requested");
                    break;
                }
                next = self.inbound.recv() => match next {
                    Some(msg) => msg,
                    None => {
                        info!("hub: all producers gone");
                        break;
                    }
                },
            };

            stats.messages += 1;
            // A recipient that never finishes a write must not hold up shutdown.
            let report = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("hub: shutdown requested during broadcast");
                    break;
                }
                report = self.broadcast(&msg) => report,
            };
            stats.deliveries += report.delivered as u64;
            stats.drops += report.dropped as u64;
        }

        // Stop accepting publishes before tearing connections down.
        self.inbound.close();

        let remaining = self.registry.drain().await;
        if !remaining.is_empty() {
            info!("hub: closing {} remaining connection(s)", remaining.len());
        }
        for conn in remaining {
            conn.close().await;
        }

        info!(
            "hub: stopped after {} message(s), {} deliveries, {} drop(s)",
            stats.messages, stats.deliveries, stats.drops
        );
        stats
    }

    /// Writes `msg` to every connection registered right now.
    pub async fn broadcast(&self, msg: &ChatMessage) -> BroadcastReport {
        let recipients = self.registry.snapshot().await;
        let mut report = BroadcastReport::default();

        for conn in recipients {
            match self.deliver(&conn, msg).await {
                Ok(()) => report.delivered += 1,
                Err(TransportError::Closed) if conn.is_closed() => {
                    // Torn down by its own handler after the snapshot was taken.
                    debug!("hub: skipping {} (already closing)", conn.id());
                }
                Err(e) => {
                    warn!(
                        "hub: dropping connection {} ({}): write failed: {e}",
                        conn.id(),
                        conn.peer()
                    );
                    self.registry.unregister(conn.id()).await;
                    conn.close().await;
                    report.dropped += 1;
                }
            }
        }

        debug!(
            "hub: broadcast {} byte body to {} recipient(s), {} dropped",
            msg.body.len(),
            report.delivered,
            report.dropped
        );
        report
    }

    async fn deliver(
        &self,
        conn: &ConnectionHandle,
        msg: &ChatMessage,
    ) -> Result<(), TransportError> {
        match self.config.write_timeout {
            Some(limit) => tokio::time::timeout(limit, conn.deliver(msg))
                .await
                .map_err(|_| TransportError::TimedOut)?,
            None => conn.deliver(msg).await,
        }
    }
}

impl HubHandle {
    /// Enqueues a message for broadcast.  Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Closed`] if the dispatch loop has stopped.
    pub fn publish(&self, msg: ChatMessage) -> Result<(), HubError> {
        self.inbound.send(msg).map_err(|_| HubError::Closed)
    }

    /// Makes a connection eligible for broadcast.
    ///
    /// # Errors
    ///
    /// See [`Registry::register`].
    pub async fn register(&self, handle: Arc<ConnectionHandle>) -> Result<(), RegistryError> {
        self.registry.register(handle).await
    }

    /// Removes a connection from broadcast.  No-op if absent.
    pub async fn unregister(&self, id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.registry.unregister(id).await
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns `true` once the dispatch loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.inbound.is_closed()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
