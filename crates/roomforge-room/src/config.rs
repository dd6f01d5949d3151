//! Room configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every room a [`Hub`](crate::Hub) creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Balance a player starts with the first time they join a room.
    pub starting_balance: i64,

    /// Number of board tiles; positions wrap around modulo this.
    pub board_size: u32,

    /// Capacity of each room actor's command channel. Senders wait when
    /// it is full.
    pub command_channel_size: usize,

    /// Frames a connection may have queued before it is considered stalled
    /// and removed from its room.
    pub outbound_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            starting_balance: 1500,
            board_size: 40,
            command_channel_size: 64,
            outbound_capacity: 256,
        }
    }
}
