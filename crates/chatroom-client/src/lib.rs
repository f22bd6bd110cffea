//! # chatroom-client
//!
//! Terminal client for the chatroom broadcast hub.
//!
//! The binary reads lines from stdin and sends each one as a chat message; it
//! prints every message the hub broadcasts.  The pieces that do not touch a
//! socket live here so they can be tested without a server.

use chatroom_core::{decode_message, decode_message_bytes, ChatMessage, ProtocolError};
use thiserror::Error;
use tokio_tungstenite::tungstenite::Message;

/// Input line that leaves the chat.
pub const QUIT_COMMAND: &str = "/quit";

/// Name printed for messages that carry no username.
const ANONYMOUS: &str = "anonymous";

/// Error type for client setup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("username must not be empty")]
    EmptyUsername,

    #[error("server URL must start with ws:// or wss://, got {0:?}")]
    InvalidServerUrl(String),
}

// ── Identity ──────────────────────────────────────────────────────────────────

/// Who this client says it is.  Attached to every outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub username: String,
}

impl Identity {
    /// # Errors
    ///
    /// Returns [`ClientError::EmptyUsername`] if `username` is blank.
    pub fn new(email: impl Into<String>, username: impl Into<String>) -> Result<Self, ClientError> {
        let username = username.into().trim().to_string();
        if username.is_empty() {
            return Err(ClientError::EmptyUsername);
        }
        Ok(Self {
            email: email.into().trim().to_string(),
            username,
        })
    }
}

/// Rejects URLs the WebSocket client cannot dial.
pub fn validate_server_url(url: &str) -> Result<(), ClientError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(ClientError::InvalidServerUrl(url.to_string()))
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// What to do with one line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Send this body to the room.
    Send(String),
    /// Nothing to send.
    Skip,
    /// Leave the room.
    Quit,
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Skip
    } else if trimmed == QUIT_COMMAND {
        Input::Quit
    } else {
        // Leading whitespace is part of the message.
        Input::Send(line.trim_end().to_string())
    }
}

pub fn compose(identity: &Identity, body: impl Into<String>) -> ChatMessage {
    ChatMessage::new(identity.email.clone(), identity.username.clone(), body)
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Formats a received message as `<username> message`.
pub fn render(msg: &ChatMessage) -> String {
    let name = if msg.display_name.is_empty() {
        ANONYMOUS
    } else {
        msg.display_name.as_str()
    };
    format!("<{name}> {}", msg.body)
}

/// Decodes a data frame.  Returns `None` for control frames.
pub fn decode_frame(frame: &Message) -> Option<Result<ChatMessage, ProtocolError>> {
    match frame {
        Message::Text(text) => Some(decode_message(text)),
        Message::Binary(bytes) => Some(decode_message_bytes(bytes)),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
