//! Transport abstraction layer for Roomforge.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the network protocol, the [`JoinParams`] every connection must carry
//! before it is handed to the room layer, and the shared outbound [`Frame`].
//! The WebSocket implementation is served by `axum`.

#![allow(async_fn_in_trait)]

mod error;
mod frame;
mod params;
mod websocket;

pub use error::TransportError;
pub use frame::Frame;
pub use params::JoinParams;
pub use websocket::{LIVENESS_PATH, UPGRADE_PATH, WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An upgraded connection together with the room it asked to join.
#[derive(Debug)]
pub struct Accepted<C> {
    /// The live connection.
    pub connection: C,
    /// Room and player name taken from the upgrade request.
    pub params: JoinParams,
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next connection that completed its upgrade with valid
    /// join parameters.
    async fn accept(
        &mut self,
    ) -> Result<Accepted<Self::Connection>, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection that sends frames and receives bytes.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a frame to the remote peer.
    async fn send(&self, frame: Frame) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
