//! Unified error type for Roomforge.

use roomforge_protocol::ProtocolError;
use roomforge_room::RoomError;
use roomforge_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoomforgeError {
    /// A transport-level error (bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
