//! The set of connections currently eligible for broadcast.
//!
//! # Concurrency
//!
//! Every Connection Handler registers and unregisters from its own task while
//! the Hub iterates from the dispatch task, so all access goes through one
//! `tokio::sync::RwLock`.  Iteration never runs user code under the lock:
//! [`Registry::for_each`] and the Hub both work from a [`Registry::snapshot`],
//! so a callback that unregisters the very connection it is visiting cannot
//! deadlock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chatroom_core::ConnectionId;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::connection::ConnectionHandle;

/// Errors returned by [`Registry::register`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A connection with the same id is already registered.
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),

    /// The connection began closing before it could be registered.
    #[error("connection {0} is closed and cannot be registered")]
    ConnectionClosed(ConnectionId),
}

/// Thread-safe map of live connections keyed by [`ConnectionId`].
#[derive(Debug, Default)]
pub struct Registry {
    connections: RwLock<HashMap<ConnectionId, Arc<ConnectionHandle>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection and moves it to `Registered`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::AlreadyRegistered`] if the id is already present.
    /// - [`RegistryError::ConnectionClosed`] if the handle is already closing.
    pub async fn register(&self, handle: Arc<ConnectionHandle>) -> Result<(), RegistryError> {
        let id = handle.id();
        let mut connections = self.connections.write().await;
        if connections.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        if !handle.mark_registered() {
            return Err(RegistryError::ConnectionClosed(id));
        }
        connections.insert(id, handle);
        debug!("registry: added {id} ({} connected)", connections.len());
        Ok(())
    }

    /// Removes a connection.  Returns the handle if it was present; removing
    /// an absent id is a no-op.
    pub async fn unregister(&self, id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(&id);
        if removed.is_some() {
            debug!("registry: removed {id} ({} connected)", connections.len());
        }
        removed
    }

    /// Returns the handles registered at this instant.
    ///
    /// The lock is released before this returns.  Order is unspecified.
    pub async fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Runs `f` on every connection in a snapshot, one at a time.
    ///
    /// `f` may freely call back into the registry, including unregistering the
    /// connection it was handed.
    pub async fn for_each<F, Fut>(&self, mut f: F)
    where
        F: FnMut(Arc<ConnectionHandle>) -> Fut,
        Fut: Future<Output = ()>,
    {
        for handle in self.snapshot().await {
            f(handle).await;
        }
    }

    /// Removes and returns every registered connection.
    pub async fn drain(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections
            .write()
            .await
            .drain()
            .map(|(_, handle)| handle)
            .collect()
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
