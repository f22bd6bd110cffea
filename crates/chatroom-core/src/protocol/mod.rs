//! Protocol module containing the message schema and the JSON codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_message, decode_message_bytes, encode_message, ProtocolError};
pub use messages::ChatMessage;
