//! JSON codec for chat messages.
//!
//! Wire format: one [`ChatMessage`] per WebSocket frame, encoded as a compact
//! JSON object.  Text frames carry the JSON directly; binary frames are
//! accepted too and must contain UTF-8 JSON.
//!
//! The codec knows nothing about framing or sockets.  The transport layer
//! hands it a complete frame payload and gets back a typed message (or the
//! reverse).

use thiserror::Error;

use crate::protocol::messages::ChatMessage;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The payload is not valid JSON or does not match the message schema.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),

    /// A binary payload did not contain valid UTF-8.
    #[error("payload is not valid UTF-8 (error at byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    /// The message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`ChatMessage`] into its JSON text form.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use chatroom_core::{decode_message, encode_message, ChatMessage};
///
/// let msg = ChatMessage::new("a@x.com", "a", "hi");
/// let text = encode_message(&msg).unwrap();
/// assert_eq!(decode_message(&text).unwrap(), msg);
/// ```
pub fn encode_message(msg: &ChatMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decodes a [`ChatMessage`] from a text frame payload.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidJson`] if the text is not a JSON object
/// (or `null`) matching the message schema.
pub fn decode_message(text: &str) -> Result<ChatMessage, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))
}

/// Decodes a [`ChatMessage`] from a binary frame payload.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidUtf8`] if the bytes are not UTF-8, or
/// [`ProtocolError::InvalidJson`] if the decoded text is not a valid message.
pub fn decode_message_bytes(bytes: &[u8]) -> Result<ChatMessage, ProtocolError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ProtocolError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    decode_message(text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_compact_json_in_field_order() {
        let msg = ChatMessage::new("a@x.com", "a", "hi");
        let text = encode_message(&msg).unwrap();
        assert_eq!(text, r#"{"email":"a@x.com","username":"a","message":"hi"}"#);
    }

    #[test]
    fn test_encode_escapes_quotes_and_newlines() {
        let msg = ChatMessage::new("q@x.com", "q", "say \"hi\"\nbye");
        let text = encode_message(&msg).unwrap();
        assert!(text.contains(r#"say \"hi\"\nbye"#));
        assert!(!text.contains('\n'), "encoded frame must be a single line");
    }

    #[test]
    fn test_decode_accepts_whitespace_around_object() {
        let msg = decode_message("  {\"email\":\"a\",\"username\":\"b\",\"message\":\"c\"}\n")
            .unwrap();
        assert_eq!(msg, ChatMessage::new("a", "b", "c"));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let result = decode_message("hello");
        assert!(matches!(result, Err(ProtocolError::InvalidJson(_))));
    }

    #[test]
    fn test_decode_rejects_json_array() {
        let result = decode_message(r#"["a@x.com","a","hi"]"#);
        assert!(matches!(result, Err(ProtocolError::InvalidJson(_))));
    }

    #[test]
    fn test_decode_rejects_empty_array() {
        let result = decode_message("[]");
        assert!(matches!(result, Err(ProtocolError::InvalidJson(_))));
    }

    #[test]
    fn test_decode_null_frame_is_empty_message() {
        assert_eq!(decode_message("null"), Ok(ChatMessage::default()));
        assert_eq!(decode_message_bytes(b" null "), Ok(ChatMessage::default()));
    }

    #[test]
    fn test_protocol_error_is_cloneable() {
        let err = ProtocolError::InvalidJson("bad".to_string());
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn test_decode_rejects_truncated_object() {
        let result = decode_message(r#"{"email":"a@x.com","username":"#);
        assert!(matches!(result, Err(ProtocolError::InvalidJson(_))));
    }

    #[test]
    fn test_decode_bytes_accepts_utf8_json() {
        let bytes = br#"{"email":"a@x.com","username":"a","message":"hi"}"#;
        let msg = decode_message_bytes(bytes).unwrap();
        assert_eq!(msg, ChatMessage::new("a@x.com", "a", "hi"));
    }

    #[test]
    fn test_decode_bytes_reports_invalid_utf8_position() {
        let bytes = [b'{', b'"', 0xFF, 0xFE];
        let result = decode_message_bytes(&bytes);
        assert_eq!(result, Err(ProtocolError::InvalidUtf8 { valid_up_to: 2 }));
    }

    #[test]
    fn test_error_messages_are_human_readable() {
        let err = ProtocolError::InvalidUtf8 { valid_up_to: 7 };
        assert_eq!(err.to_string(), "payload is not valid UTF-8 (error at byte 7)");
    }
}
