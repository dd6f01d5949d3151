//! Wire protocol for Roomforge.
//!
//! This crate defines the "language" that clients and the room server speak:
//!
//! - **Types** ([`WireEvent`], [`EventKind`], typed payloads such as
//!   [`RollDice`]): the units that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those units are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the room layer
//! (game state). It doesn't know about connections or rooms; it only knows
//! how to serialize and deserialize events.
//!
//! ```text
//! Transport (bytes) → Protocol (WireEvent) → Room (dispatch + broadcast)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    BuyProperty, EventKind, PlayerJoined, RollDice, TurnChanged, WireEvent,
};
