//! Domain entities for the chatroom.
//!
//! # Modules
//!
//! - [`connection`] – Connection identity and the per-connection lifecycle
//!   state machine.

pub mod connection;

pub use connection::{ConnectionId, ConnectionState};
