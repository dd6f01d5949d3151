//! # Roomforge
//!
//! Real-time multiplayer room coordinator.
//!
//! Clients attach over WebSocket to `/ws?roomId=..&playerName=..`. Rooms are
//! created on first join and live for the life of the process. Every event a
//! client sends is routed to the handler registered for its kind, and the
//! handler's result is broadcast to everyone in the room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomforge::prelude::*;
//!
//! # async fn start() -> Result<(), RoomforgeError> {
//! let server = RoomforgeServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::RoomforgeError;
pub use server::{RoomforgeServer, RoomforgeServerBuilder};

/// Everything needed to run a server or plug in a custom handler.
pub mod prelude {
    pub use crate::{
        ConfigError, RoomforgeError, RoomforgeServer, RoomforgeServerBuilder,
        ServerConfig,
    };
    pub use roomforge_protocol::{
        BuyProperty, Codec, EventKind, JsonCodec, PlayerJoined, ProtocolError,
        RollDice, TurnChanged, WireEvent,
    };
    pub use roomforge_room::{
        DispatchError, Dispatcher, EventHandler, GameState, Hub, PlayerState,
        RoomConfig, RoomError, RoomHandle, RoomSnapshot,
    };
    pub use roomforge_transport::{ConnectionId, JoinParams, TransportError};
}
