//! Room actor: an isolated Tokio task that owns one game instance.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The actor is the room's single writer: joins,
//! leaves, event handling and broadcasts are processed one command at a
//! time, so a broadcast can never observe a membership change half-way.
//!
//! Broadcasting never performs I/O. The actor pushes the encoded frame into
//! each connection's bounded outbound queue with `try_send`; a per-connection
//! writer task (owned by the server) drains that queue onto the socket. A
//! closed queue means the peer is gone, a full one means it stopped reading.
//! Either way the connection is removed and its queue dropped, which in turn
//! stops its writer.

use std::collections::BTreeMap;
use std::sync::Arc;

use roomforge_protocol::{Codec, EventKind, PlayerJoined, WireEvent};
use roomforge_transport::{ConnectionId, Frame};
use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::{DispatchError, Dispatcher, GameState, PlayerState, RoomConfig, RoomError};

/// A connection's outbound queue, as seen by the room.
///
/// The room holds only this sending half; the socket itself belongs to the
/// connection's tasks.
pub type ConnectionSender = mpsc::Sender<Frame>;

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    /// Register a connection under a player name.
    Join {
        conn_id: ConnectionId,
        player_name: String,
        sender: ConnectionSender,
        reply: oneshot::Sender<()>,
    },

    /// Deregister a connection. Replies whether it was still registered.
    Leave {
        conn_id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },

    /// Deliver an inbound event from a connection.
    Event {
        conn_id: ConnectionId,
        event: WireEvent,
    },

    /// Request a copy of the room's state.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// A point-in-time copy of a room's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    /// The room's id.
    pub room_id: String,
    /// Every player that ever joined, in join order.
    pub players: Vec<PlayerState>,
    /// Current turn holder.
    pub current_turn: Option<String>,
    /// Player name of each live connection, ordered by connection id.
    pub connected: Vec<String>,
}

impl RoomSnapshot {
    /// Looks up a player by name.
    pub fn player(&self, name: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connected.len()
    }
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the room id. The
/// [`Hub`](crate::Hub) holds one per room for the life of the process.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: Arc<str>,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("room_id", &self.room_id)
            .finish_non_exhaustive()
    }
}

impl RoomHandle {
    /// Returns the room's id.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Returns `true` if both handles talk to the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Registers `conn_id` as `player_name`, creating the player's state if
    /// the name is new, and announces the join to every member (the new
    /// connection included).
    pub async fn join(
        &self,
        conn_id: ConnectionId,
        player_name: impl Into<String>,
        sender: ConnectionSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            conn_id,
            player_name: player_name.into(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Deregisters a connection. Player state is kept.
    ///
    /// Returns `Ok(false)` if the connection was not registered (already
    /// left, or removed after a failed send).
    pub async fn leave(&self, conn_id: ConnectionId) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            conn_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Queues an inbound event for dispatch (fire-and-forget).
    pub async fn submit(
        &self,
        conn_id: ConnectionId,
        event: WireEvent,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Event { conn_id, event }).await
    }

    /// Returns a copy of the room's current state.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.to_string())
    }
}

/// A registered connection.
struct Member {
    player_name: String,
    sender: ConnectionSender,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<C: Codec> {
    state: GameState,
    config: RoomConfig,
    /// Ordered so fan-out follows a stable order.
    members: BTreeMap<ConnectionId, Member>,
    dispatcher: Arc<Dispatcher>,
    codec: C,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<C: Codec> RoomActor<C> {
    /// Runs the actor loop until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(room_id = %self.state.room_id(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    conn_id,
                    player_name,
                    sender,
                    reply,
                } => {
                    self.handle_join(conn_id, player_name, sender);
                    let _ = reply.send(());
                }
                RoomCommand::Leave { conn_id, reply } => {
                    let removed = self.remove_member(conn_id, "left");
                    let _ = reply.send(removed);
                }
                RoomCommand::Event { conn_id, event } => {
                    self.handle_event(conn_id, event);
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        tracing::info!(room_id = %self.state.room_id(), "room actor stopped");
    }

    fn handle_join(
        &mut self,
        conn_id: ConnectionId,
        player_name: String,
        sender: ConnectionSender,
    ) {
        let created = self
            .state
            .add_player(&player_name, self.config.starting_balance);
        self.members.insert(
            conn_id,
            Member {
                player_name: player_name.clone(),
                sender,
            },
        );
        tracing::info!(
            room_id = %self.state.room_id(),
            %conn_id,
            player = %player_name,
            new_player = created,
            connections = self.members.len(),
            "player joined"
        );

        match WireEvent::new(
            EventKind::PlayerJoined,
            self.state.room_id(),
            &PlayerJoined {
                player: player_name,
            },
        ) {
            Ok(event) => self.broadcast(&event),
            Err(e) => {
                tracing::warn!(error = %e, "failed to build join notification");
            }
        }
    }

    fn handle_event(&mut self, conn_id: ConnectionId, event: WireEvent) {
        let Some(member) = self.members.get(&conn_id) else {
            tracing::debug!(
                room_id = %self.state.room_id(),
                %conn_id,
                kind = %event.kind,
                "event from non-member, ignoring"
            );
            return;
        };
        let player = member.player_name.clone();

        match self.dispatcher.dispatch(&mut self.state, &event) {
            Ok(Some(outbound)) => self.broadcast(&outbound),
            Ok(None) => {}
            Err(DispatchError::UnknownEventKind(kind)) => {
                tracing::debug!(
                    room_id = %self.state.room_id(),
                    %player,
                    %kind,
                    "unknown event kind, dropping"
                );
            }
            Err(e) => {
                tracing::debug!(
                    room_id = %self.state.room_id(),
                    %player,
                    kind = %event.kind,
                    error = %e,
                    "event rejected"
                );
            }
        }
    }

    /// Delivers `event` to every registered connection. Connections whose
    /// queue is closed or full are removed afterwards.
    fn broadcast(&mut self, event: &WireEvent) {
        let frame = match self.codec.encode(event) {
            Ok(bytes) => Frame::new(bytes),
            Err(e) => {
                tracing::warn!(
                    room_id = %self.state.room_id(),
                    error = %e,
                    "failed to encode broadcast"
                );
                return;
            }
        };

        let mut failed = Vec::new();
        for (conn_id, member) in &self.members {
            match member.sender.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        room_id = %self.state.room_id(),
                        %conn_id,
                        player = %member.player_name,
                        "outbound queue full, dropping stalled connection"
                    );
                    failed.push(*conn_id);
                }
                Err(TrySendError::Closed(_)) => failed.push(*conn_id),
            }
        }

        for conn_id in failed {
            self.remove_member(conn_id, "send failed");
        }
    }

    /// Removes a connection if present. Player state stays.
    fn remove_member(&mut self, conn_id: ConnectionId, reason: &str) -> bool {
        let Some(member) = self.members.remove(&conn_id) else {
            return false;
        };
        tracing::info!(
            room_id = %self.state.room_id(),
            %conn_id,
            player = %member.player_name,
            reason,
            connections = self.members.len(),
            "player left"
        );
        true
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.state.room_id().to_string(),
            players: self.state.players().cloned().collect(),
            current_turn: self.state.current_turn().map(str::to_string),
            connected: self
                .members
                .values()
                .map(|m| m.player_name.clone())
                .collect(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// The command channel is bounded by `config.command_channel_size`: when it
/// fills up, senders wait.
pub(crate) fn spawn_room<C: Codec>(
    room_id: &str,
    config: RoomConfig,
    dispatcher: Arc<Dispatcher>,
    codec: C,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_channel_size.max(1));

    let actor = RoomActor {
        state: GameState::new(room_id),
        config,
        members: BTreeMap::new(),
        dispatcher,
        codec,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id: Arc::from(room_id),
        sender: tx,
    }
}
