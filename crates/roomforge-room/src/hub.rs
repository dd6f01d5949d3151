//! Hub: the process-wide directory of rooms.

use std::collections::HashMap;
use std::sync::Arc;

use roomforge_protocol::{Codec, JsonCodec};
use roomforge_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::room::spawn_room;
use crate::{ConnectionSender, Dispatcher, RoomConfig, RoomError, RoomHandle};

/// Maps room ids to running room actors.
///
/// Rooms are created lazily the first time an id is used and live for the
/// rest of the process. The map lock is held only for the lookup and the
/// insert; it is never held across a call into a room, so a slow room cannot
/// stall joins to other rooms.
///
/// Share it behind an `Arc`.
pub struct Hub<C: Codec = JsonCodec> {
    rooms: Mutex<HashMap<String, RoomHandle>>,
    config: RoomConfig,
    dispatcher: Arc<Dispatcher>,
    codec: C,
}

impl Hub<JsonCodec> {
    /// A hub whose rooms use the standard handlers and JSON on the wire.
    pub fn new(config: RoomConfig) -> Self {
        let dispatcher = Dispatcher::standard(&config);
        Self::with_parts(config, dispatcher, JsonCodec)
    }
}

impl<C: Codec + Clone> Hub<C> {
    /// A hub with a custom dispatcher and codec.
    pub fn with_parts(config: RoomConfig, dispatcher: Dispatcher, codec: C) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
            dispatcher: Arc::new(dispatcher),
            codec,
        }
    }

    /// Returns the room for `room_id`, spawning it if it does not exist yet.
    ///
    /// Concurrent calls for the same id all get a handle to the same actor.
    pub async fn resolve_or_create(&self, room_id: &str) -> RoomHandle {
        let mut rooms = self.rooms.lock().await;
        if let Some(handle) = rooms.get(room_id) {
            return handle.clone();
        }

        let handle = spawn_room(
            room_id,
            self.config.clone(),
            Arc::clone(&self.dispatcher),
            self.codec.clone(),
        );
        rooms.insert(room_id.to_string(), handle.clone());
        tracing::info!(room_id, rooms = rooms.len(), "room created");
        handle
    }

    /// Returns the room for `room_id` without creating it.
    pub async fn resolve(&self, room_id: &str) -> Result<RoomHandle, RoomError> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))
    }

    /// Joins `conn_id` to `room_id` as `player_name`, creating the room on
    /// demand. Returns the room's handle for the connection to keep.
    pub async fn join(
        &self,
        room_id: &str,
        conn_id: ConnectionId,
        player_name: &str,
        sender: ConnectionSender,
    ) -> Result<RoomHandle, RoomError> {
        let handle = self.resolve_or_create(room_id).await;
        handle.join(conn_id, player_name, sender).await?;
        Ok(handle)
    }

    /// Like [`join`](Self::join), but fails with [`RoomError::NotFound`]
    /// instead of creating the room.
    pub async fn join_existing(
        &self,
        room_id: &str,
        conn_id: ConnectionId,
        player_name: &str,
        sender: ConnectionSender,
    ) -> Result<RoomHandle, RoomError> {
        let handle = self.resolve(room_id).await?;
        handle.join(conn_id, player_name, sender).await?;
        Ok(handle)
    }

    /// Number of rooms created so far.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// All room ids, sorted.
    pub async fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The settings every room is created with.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }
}

impl Default for Hub<JsonCodec> {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
