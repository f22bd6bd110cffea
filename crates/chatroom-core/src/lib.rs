//! # chatroom-core
//!
//! Shared library for the chatroom broadcast hub containing the wire schema,
//! the JSON codec, and the connection domain types.
//!
//! This crate is used by both the server and the terminal client.  It has no
//! dependencies on async runtimes, sockets, or WebSocket libraries.
//!
//! # Architecture overview
//!
//! The chatroom is a fan-out hub: every message any client sends is written
//! back out to every client currently connected, the sender included.
//!
//! - **`protocol`** – What travels over the wire.  One message shape,
//!   [`ChatMessage`], encoded as a JSON object with the keys `email`,
//!   `username`, and `message`.
//!
//! - **`domain`** – Identity and lifecycle of a connection: the
//!   [`ConnectionId`] used as the registry key and the [`ConnectionState`]
//!   machine that guarantees a connection is closed at most once.

pub mod domain;
pub mod protocol;

pub use domain::connection::{ConnectionId, ConnectionState};
pub use protocol::codec::{decode_message, decode_message_bytes, encode_message, ProtocolError};
pub use protocol::messages::ChatMessage;
