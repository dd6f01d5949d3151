//! Error types for the protocol layer.
//!
//! Each crate in Roomforge defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in serialization or in the
//! shape of a message, not in networking or room bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// wrong data types, or truncated messages.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The `kind` string does not name any known event.
    #[error("unknown event kind: {0}")]
    UnknownKind(String),

    /// The message parsed but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
