//! Integration tests for the chatroom wire schema.
//!
//! These tests pin the exact JSON that browser clients send and expect back,
//! going through the public codec API only.

use chatroom_core::{decode_message, decode_message_bytes, encode_message, ChatMessage, ProtocolError};

/// Decodes a frame and re-encodes it, as the hub does for every message.
fn relay(frame: &str) -> String {
    let msg = decode_message(frame).expect("decode must succeed");
    encode_message(&msg).expect("encode must succeed")
}

#[test]
fn test_browser_frame_is_relayed_unchanged() {
    let frame = r#"{"email":"a@x.com","username":"a","message":"hi"}"#;
    assert_eq!(relay(frame), frame);
}

#[test]
fn test_relayed_frame_uses_canonical_key_order() {
    // Browsers may send keys in any order; the hub always writes them in
    // email, username, message order.
    let frame = r#"{"message":"hi","username":"a","email":"a@x.com"}"#;
    assert_eq!(
        relay(frame),
        r#"{"email":"a@x.com","username":"a","message":"hi"}"#
    );
}

#[test]
fn test_extra_keys_are_dropped_on_relay() {
    let frame = r#"{"email":"a@x.com","username":"a","message":"hi","ts":1700000000}"#;
    assert_eq!(
        relay(frame),
        r#"{"email":"a@x.com","username":"a","message":"hi"}"#
    );
}

#[test]
fn test_partial_frame_is_relayed_with_empty_fields() {
    let frame = r#"{"username":"anon"}"#;
    assert_eq!(
        relay(frame),
        r#"{"email":"","username":"anon","message":""}"#
    );
}

#[test]
fn test_empty_object_is_a_valid_message() {
    let msg = decode_message("{}").unwrap();
    assert_eq!(msg, ChatMessage::default());
}

#[test]
fn test_binary_frame_decodes_like_text_frame() {
    let frame = r#"{"email":"b@y.org","username":"b","message":"binary"}"#;
    let from_text = decode_message(frame).unwrap();
    let from_bytes = decode_message_bytes(frame.as_bytes()).unwrap();
    assert_eq!(from_text, from_bytes);
}

#[test]
fn test_malformed_frames_are_rejected() {
    let cases = [
        "",
        "not json",
        "[]",
        r#"["a@x.com","a","hi"]"#,
        "42",
        r#""a string""#,
        r#"{"message":"#,
        r#"{"message":1}"#,
    ];
    for frame in cases {
        let result = decode_message(frame);
        assert!(
            matches!(result, Err(ProtocolError::InvalidJson(_))),
            "expected InvalidJson for {frame:?}, got {result:?}"
        );
    }
}

#[test]
fn test_null_frame_relays_as_empty_message() {
    let decoded = decode_message("null").unwrap();
    assert_eq!(decoded, ChatMessage::default());
    assert_eq!(
        encode_message(&decoded).unwrap(),
        r#"{"email":"","username":"","message":""}"#
    );
}

#[test]
fn test_large_body_is_preserved() {
    let body = "a".repeat(64 * 1024);
    let msg = ChatMessage::new("big@x.com", "big", body.clone());
    let decoded = decode_message(&encode_message(&msg).unwrap()).unwrap();
    assert_eq!(decoded.body.len(), body.len());
    assert_eq!(decoded, msg);
}
