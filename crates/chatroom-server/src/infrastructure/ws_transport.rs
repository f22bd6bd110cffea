//! WebSocket adapters for the transport traits.
//!
//! An upgraded `WebSocketStream` is split into its read and write halves.
//! [`WsMessageSource`] wraps the read half and [`WsMessageSink`] wraps the
//! write half, converting between WebSocket frames and [`ChatMessage`]s with
//! the chatroom-core JSON codec.
//!
//! # Frame handling
//!
//! | Inbound frame      | Result                                  |
//! |--------------------|-----------------------------------------|
//! | Text / Binary      | decoded as JSON; bad JSON is an error   |
//! | Ping / Pong / Frame| skipped (tungstenite answers pings)     |
//! | Close / end        | `TransportError::Closed`                |
//!
//! Outbound messages are always sent as a single JSON text frame.

use async_trait::async_trait;
use chatroom_core::{decode_message, decode_message_bytes, encode_message, ChatMessage};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;

use crate::application::transport::{MessageSink, MessageSource, TransportError};

/// Splits an upgraded WebSocket into transport halves.
pub fn split_websocket<S>(ws: WebSocketStream<S>) -> (WsMessageSource<S>, WsMessageSink<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sink, stream) = ws.split();
    (WsMessageSource { stream }, WsMessageSink { sink })
}

/// Read half of a WebSocket connection.
pub struct WsMessageSource<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

/// Write half of a WebSocket connection.
pub struct WsMessageSink<S> {
    sink: SplitSink<WebSocketStream<S>, WsMessage>,
}

#[async_trait]
impl<S> MessageSource for WsMessageSource<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<ChatMessage, TransportError> {
        loop {
            let frame = match self.stream.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Err(map_ws_error(e)),
                None => return Err(TransportError::Closed),
            };

            match frame {
                WsMessage::Text(text) => return Ok(decode_message(&text)?),
                WsMessage::Binary(bytes) => return Ok(decode_message_bytes(&bytes)?),
                WsMessage::Close(_) => return Err(TransportError::Closed),
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            }
        }
    }
}

#[async_trait]
impl<S> MessageSink for WsMessageSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, msg: &ChatMessage) -> Result<(), TransportError> {
        let text = encode_message(msg)?;
        self.sink
            .send(WsMessage::Text(text))
            .await
            .map_err(map_ws_error)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.sink.close().await {
            Ok(()) => Ok(()),
            Err(e) => match map_ws_error(e) {
                TransportError::Closed => Ok(()),
                other => Err(other),
            },
        }
    }
}

fn map_ws_error(err: WsError) -> TransportError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        other => TransportError::Io(other.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
