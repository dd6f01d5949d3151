//! Error types for the room layer.

use roomforge_protocol::{EventKind, ProtocolError};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist and the caller asked not to create it.
    #[error("room {0} not found")]
    NotFound(String),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(String),
}

/// Why an inbound event was dropped without touching room state.
///
/// None of these are fatal: the room logs them and carries on, and the
/// sender gets no reply.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler is registered for this kind.
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    /// The payload is missing fields or has the wrong types.
    #[error("malformed {kind} payload: {reason}")]
    MalformedPayload {
        /// The kind whose payload failed validation.
        kind: EventKind,
        /// Human-readable cause.
        reason: String,
    },

    /// The payload names a player this room has never seen.
    #[error("player {0} is not in this room")]
    UnknownPlayer(String),

    /// Building the outbound event failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl DispatchError {
    pub(crate) fn malformed(kind: EventKind, reason: impl ToString) -> Self {
        Self::MalformedPayload {
            kind,
            reason: reason.to_string(),
        }
    }
}
