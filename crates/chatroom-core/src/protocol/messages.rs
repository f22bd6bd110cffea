//! The chat message schema shared by every participant.
//!
//! There is exactly one message shape in the chatroom protocol and it flows in
//! both directions: clients send it to the hub, and the hub writes the very
//! same value back out to every connected client.
//!
//! # JSON representation
//!
//! ```json
//! {"email":"a@x.com","username":"a","message":"hi"}
//! ```
//!
//! The three key names are fixed by existing browser clients and must not
//! change.  The Rust field names describe what each value *means*; serde
//! renames them to the wire names.
//!
//! # Lenient decoding
//!
//! Existing clients are not strict about the payload they send, so decoding is
//! forgiving:
//!
//! - unknown keys are ignored,
//! - key names match case-insensitively (`"Email"` fills `email`),
//! - a missing key decodes as the empty string,
//! - an explicit `null` value leaves the field as it was,
//! - a bare `null` frame decodes as an empty message.
//!
//! Only a JSON object (or `null`) is a message.  Arrays, strings, and numbers
//! are rejected, as is a key holding the wrong JSON type (for example a number
//! for `message`).  When a key appears twice the last value wins.

use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// One chat message as it travels through the hub.
///
/// The value is immutable once built; the hub moves it through the inbound
/// queue by value and serializes it once per recipient.
///
/// # Example
///
/// ```rust
/// use chatroom_core::ChatMessage;
///
/// let msg = ChatMessage::new("a@x.com", "a", "hi");
/// let json = serde_json::to_string(&msg).unwrap();
/// assert_eq!(json, r#"{"email":"a@x.com","username":"a","message":"hi"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChatMessage {
    /// Opaque identifier of the sender, usually an email address.
    #[serde(rename = "email")]
    pub sender_identity: String,

    /// Name shown next to the message in the chat window.
    #[serde(rename = "username")]
    pub display_name: String,

    /// The message text.
    #[serde(rename = "message")]
    pub body: String,
}

impl ChatMessage {
    /// Builds a message from its three parts.
    pub fn new(
        sender_identity: impl Into<String>,
        display_name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender_identity: sender_identity.into(),
            display_name: display_name.into(),
            body: body.into(),
        }
    }
}

// ── Deserialization ───────────────────────────────────────────────────────────

impl<'de> Deserialize<'de> for ChatMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only an object or `null` is a message; sequences are rejected.
        deserializer.deserialize_any(ChatMessageVisitor)
    }
}

struct ChatMessageVisitor;

impl<'de> Visitor<'de> for ChatMessageVisitor {
    type Value = ChatMessage;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a chat message object")
    }

    fn visit_unit<E: de::Error>(self) -> Result<ChatMessage, E> {
        Ok(ChatMessage::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<ChatMessage, E> {
        Ok(ChatMessage::default())
    }

    fn visit_map<A>(self, mut map: A) -> Result<ChatMessage, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut msg = ChatMessage::default();
        while let Some(key) = map.next_key::<String>()? {
            let field = if key.eq_ignore_ascii_case("email") {
                &mut msg.sender_identity
            } else if key.eq_ignore_ascii_case("username") {
                &mut msg.display_name
            } else if key.eq_ignore_ascii_case("message") {
                &mut msg.body
            } else {
                map.next_value::<IgnoredAny>()?;
                continue;
            };
            if let Some(value) = map.next_value::<Option<String>>()? {
                *field = value;
            }
        }
        Ok(msg)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_wire_key_names() {
        // Arrange
        let msg = ChatMessage::new("a@x.com", "a", "hi");

        // Act
        let value = serde_json::to_value(&msg).unwrap();

        // Assert: exactly the three wire keys, nothing else
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["email"], "a@x.com");
        assert_eq!(obj["username"], "a");
        assert_eq!(obj["message"], "hi");
    }

    #[test]
    fn test_deserializes_from_wire_key_names() {
        let json = r#"{"email":"b@y.org","username":"bee","message":"hello there"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ChatMessage::new("b@y.org", "bee", "hello there"));
    }

    #[test]
    fn test_missing_keys_decode_as_empty_strings() {
        let msg: ChatMessage = serde_json::from_str(r#"{"message":"only a body"}"#).unwrap();
        assert_eq!(msg.sender_identity, "");
        assert_eq!(msg.display_name, "");
        assert_eq!(msg.body, "only a body");
    }

    #[test]
    fn test_null_values_decode_as_empty_strings() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"email":null,"username":"n","message":null}"#).unwrap();
        assert_eq!(msg, ChatMessage::new("", "n", ""));
    }

    #[test]
    fn test_null_value_keeps_earlier_value() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"username":"first","username":null}"#).unwrap();
        assert_eq!(msg.display_name, "first");
    }

    #[test]
    fn test_duplicate_key_last_value_wins() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"message":"one","message":"two"}"#).unwrap();
        assert_eq!(msg.body, "two");
    }

    #[test]
    fn test_key_names_match_case_insensitively() {
        let json = r#"{"EMAIL":"a@x.com","UserName":"a","Message":"hi"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ChatMessage::new("a@x.com", "a", "hi"));
    }

    #[test]
    fn test_bare_null_is_an_empty_message() {
        let msg: ChatMessage = serde_json::from_str("null").unwrap();
        assert_eq!(msg, ChatMessage::default());
    }

    #[test]
    fn test_positional_array_is_rejected() {
        let full: Result<ChatMessage, _> = serde_json::from_str(r#"["a@x.com","a","hi"]"#);
        let empty: Result<ChatMessage, _> = serde_json::from_str("[]");
        assert!(full.is_err());
        assert!(empty.is_err());
    }

    #[test]
    fn test_scalar_frames_are_rejected() {
        for json in [r#""hi""#, "42", "true"] {
            let result: Result<ChatMessage, _> = serde_json::from_str(json);
            assert!(result.is_err(), "{json} is not a message");
        }
    }

    #[test]
    fn test_nested_unknown_values_are_skipped() {
        let json = r#"{"meta":{"a":[1,2,{"b":null}]},"message":"hi"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.body, "hi");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let json = r#"{"email":"a@x.com","username":"a","message":"hi","color":"red"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ChatMessage::new("a@x.com", "a", "hi"));
    }

    #[test]
    fn test_wrong_value_type_is_rejected() {
        let result: Result<ChatMessage, _> =
            serde_json::from_str(r#"{"email":"a@x.com","username":"a","message":42}"#);
        assert!(result.is_err(), "a number is not a valid message body");
    }

    #[test]
    fn test_rust_field_names_are_not_accepted_on_the_wire() {
        // The internal names must never leak into the protocol.
        let json = r#"{"sender_identity":"a@x.com","display_name":"a","body":"hi"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg, ChatMessage::default());
    }

    #[test]
    fn test_unicode_body_survives_serialization() {
        let original = ChatMessage::new("u@x.com", "ユーザー", "héllo 👋\nsecond line");
        let json = serde_json::to_string(&original).unwrap();
        let decoded: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }
}
