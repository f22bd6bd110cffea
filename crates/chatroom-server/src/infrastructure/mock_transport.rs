//! In-memory transport for unit and integration testing.
//!
//! [`mock_connection`] returns the two halves a real transport would produce
//! plus a [`MockPeer`] that plays the remote client.  Through the peer, a test
//! can inject inbound messages, end the stream, observe what the hub wrote,
//! and make writes fail or stall, all without a socket.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chatroom_core::ChatMessage;
use tokio::sync::{mpsc, Notify};

use crate::application::transport::{MessageSink, MessageSource, TransportError};

type Inbound = Result<ChatMessage, TransportError>;

#[derive(Default)]
struct PeerState {
    received: Mutex<Vec<ChatMessage>>,
    fail_writes: AtomicBool,
    stall_writes: AtomicBool,
    write_attempts: AtomicUsize,
    closes: AtomicUsize,
    activity: Notify,
}

impl PeerState {
    fn received(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates a connected mock source, sink, and test-side peer.
pub fn mock_connection() -> (MockSource, MockSink, MockPeer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(PeerState::default());
    (
        MockSource { inbound: rx },
        MockSink {
            state: Arc::clone(&state),
        },
        MockPeer {
            inbound: Some(tx),
            state,
        },
    )
}

/// Read half fed by [`MockPeer::send`].
pub struct MockSource {
    inbound: mpsc::UnboundedReceiver<Inbound>,
}

#[async_trait]
impl MessageSource for MockSource {
    async fn recv(&mut self) -> Result<ChatMessage, TransportError> {
        match self.inbound.recv().await {
            Some(item) => item,
            None => Err(TransportError::Closed),
        }
    }
}

/// Write half observed through [`MockPeer::received`].
pub struct MockSink {
    state: Arc<PeerState>,
}

#[async_trait]
impl MessageSink for MockSink {
    async fn send(&mut self, msg: &ChatMessage) -> Result<(), TransportError> {
        self.state.write_attempts.fetch_add(1, Ordering::SeqCst);
        self.state.activity.notify_waiters();
        if self.state.stall_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Io("injected write failure".to_string()));
        }
        self.state.received().push(msg.clone());
        self.state.activity.notify_waiters();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        self.state.activity.notify_waiters();
        Ok(())
    }
}

/// The remote end of a mock connection, driven by the test.
pub struct MockPeer {
    inbound: Option<mpsc::UnboundedSender<Inbound>>,
    state: Arc<PeerState>,
}

impl MockPeer {
    /// Delivers a message to the server side as if the client sent it.
    ///
    /// Returns `false` if the stream has already ended.
    pub fn send(&self, msg: ChatMessage) -> bool {
        self.push(Ok(msg))
    }

    /// Makes the next read on the server side fail with `err`.
    pub fn send_error(&self, err: TransportError) -> bool {
        self.push(Err(err))
    }

    /// Ends the inbound stream, as if the client disconnected cleanly.
    pub fn disconnect(&mut self) {
        self.inbound = None;
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent write hang until the caller gives up.
    pub fn stall_writes(&self, stall: bool) {
        self.state.stall_writes.store(stall, Ordering::SeqCst);
    }

    /// Messages the server has successfully written to this peer, in order.
    pub fn received(&self) -> Vec<ChatMessage> {
        self.state.received().clone()
    }

    /// Number of write attempts, successful or not.
    pub fn write_attempts(&self) -> usize {
        self.state.write_attempts.load(Ordering::SeqCst)
    }

    /// Number of times the server closed this connection's sink.
    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Waits until at least `count` messages have been received.
    ///
    /// Returns the received messages, or `None` if `limit` elapsed first.
    pub async fn wait_for_messages(
        &self,
        count: usize,
        limit: Duration,
    ) -> Option<Vec<ChatMessage>> {
        tokio::time::timeout(limit, async {
            loop {
                let notified = self.state.activity.notified();
                if self.state.received().len() >= count {
                    return self.received();
                }
                notified.await;
            }
        })
        .await
        .ok()
    }

    /// Waits until the server has attempted at least `count` writes.
    ///
    /// Returns `false` if `limit` elapsed first.
    pub async fn wait_for_write_attempts(&self, count: usize, limit: Duration) -> bool {
        tokio::time::timeout(limit, async {
            loop {
                let notified = self.state.activity.notified();
                if self.write_attempts() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    /// Waits until the server has closed this connection.
    ///
    /// Returns `false` if `limit` elapsed first.
    pub async fn wait_for_close(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, async {
            loop {
                let notified = self.state.activity.notified();
                if self.close_count() > 0 {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    fn push(&self, item: Inbound) -> bool {
        match &self.inbound {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_peer_send_is_read_by_source() {
        let (mut source, _sink, peer) = mock_connection();
        let msg = ChatMessage::new("a@x.com", "a", "hi");

        assert!(peer.send(msg.clone()));

        assert_eq!(source.recv().await, Ok(msg));
    }

    #[tokio::test]
    async fn test_disconnect_reads_as_closed() {
        let (mut source, _sink, mut peer) = mock_connection();
        peer.disconnect();
        assert_eq!(source.recv().await, Err(TransportError::Closed));
        assert!(!peer.send(ChatMessage::default()));
    }

    #[tokio::test]
    async fn test_injected_read_error_is_returned() {
        let (mut source, _sink, peer) = mock_connection();
        peer.send_error(TransportError::Io("boom".to_string()));
        assert_eq!(
            source.recv().await,
            Err(TransportError::Io("boom".to_string()))
        );
    }

    #[tokio::test]
    async fn test_sink_writes_are_observed_by_peer() {
        let (_source, mut sink, peer) = mock_connection();
        let msg = ChatMessage::new("b@x.com", "b", "yo");

        sink.send(&msg).await.unwrap();

        assert_eq!(peer.received(), vec![msg]);
        assert_eq!(peer.write_attempts(), 1);
    }

    #[tokio::test]
    async fn test_fail_writes_rejects_and_counts_attempt() {
        let (_source, mut sink, peer) = mock_connection();
        peer.fail_writes(true);

        let result = sink.send(&ChatMessage::default()).await;

        assert!(matches!(result, Err(TransportError::Io(_))));
        assert!(peer.received().is_empty());
        assert_eq!(peer.write_attempts(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_write_attempts_sees_stalled_write() {
        let (_source, mut sink, peer) = mock_connection();
        peer.stall_writes(true);

        let writer = tokio::spawn(async move { sink.send(&ChatMessage::default()).await });

        assert!(peer.wait_for_write_attempts(1, Duration::from_secs(1)).await);
        assert!(peer.received().is_empty());
        writer.abort();
    }

    #[tokio::test]
    async fn test_stalled_write_never_completes() {
        let (_source, mut sink, peer) = mock_connection();
        peer.stall_writes(true);
        let msg = ChatMessage::default();

        let result = tokio::time::timeout(Duration::from_millis(50), sink.send(&msg)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_messages_wakes_on_write() {
        let (_source, mut sink, peer) = mock_connection();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            sink.send(&ChatMessage::new("c", "c", "late")).await.unwrap();
            sink
        });

        let got = peer.wait_for_messages(1, Duration::from_secs(1)).await;

        assert_eq!(got.map(|m| m.len()), Some(1));
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_counted() {
        let (_source, mut sink, peer) = mock_connection();
        sink.close().await.unwrap();
        assert_eq!(peer.close_count(), 1);
        assert!(peer.wait_for_close(Duration::from_millis(10)).await);
    }
}
