//! Room registry and event dispatch for Roomforge.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its game
//! state and the outbound queues of the connections that joined it. The
//! [`Hub`] maps room ids to running rooms and creates them on first use.
//!
//! # Key types
//!
//! - [`Hub`]: resolves or creates rooms, routes joins
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Dispatcher`] / [`EventHandler`]: route inbound events by kind
//! - [`GameState`] / [`PlayerState`]: the per-room bookkeeping
//! - [`RoomConfig`]: starting balance, board size, queue sizes

mod config;
mod dispatcher;
mod error;
mod handlers;
mod hub;
mod room;
mod state;

pub use config::RoomConfig;
pub use dispatcher::{Dispatcher, EventHandler};
pub use error::{DispatchError, RoomError};
pub use handlers::{BuyPropertyHandler, EndTurnHandler, RollDiceHandler};
pub use hub::Hub;
pub use room::{ConnectionSender, RoomHandle, RoomSnapshot};
pub use roomforge_transport::Frame;
pub use state::{GameState, PlayerState};
