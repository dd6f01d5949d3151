//! Per-connection handler: join, outbound writer, and inbound event loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Join the room named in the upgrade request (creating it on demand)
//!   2. Spawn a writer task that drains the connection's outbound queue
//!   3. Loop: receive frames → decode → submit to the room, until the peer
//!      goes away or the writer stops
//!   4. On any exit, leave the room

use std::sync::Arc;
use std::time::Duration;

use roomforge_protocol::{Codec, ProtocolError, WireEvent};
use roomforge_room::{Frame, RoomHandle};
use roomforge_transport::{Accepted, Connection, ConnectionId, WebSocketConnection};
use tokio::sync::{mpsc, oneshot};

use crate::RoomforgeError;
use crate::server::ServerState;

/// Drop guard that removes the connection from its room when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async leave.
struct MembershipGuard {
    conn_id: ConnectionId,
    room: RoomHandle,
}

impl Drop for MembershipGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let room = self.room.clone();
        tokio::spawn(async move {
            if let Err(e) = room.leave(conn_id).await {
                tracing::debug!(%conn_id, error = %e, "leave failed");
            }
        });
    }
}

/// Handles a single connection from join to close.
pub(crate) async fn handle_connection<C: Codec + Clone>(
    accepted: Accepted<WebSocketConnection>,
    state: Arc<ServerState<C>>,
) -> Result<(), RoomforgeError> {
    let Accepted { connection, params } = accepted;
    let conn = Arc::new(connection);
    let conn_id = conn.id();
    let player = params.player_name;

    let (outbound_tx, outbound_rx) =
        mpsc::channel(state.hub.config().outbound_capacity.max(1));
    let (writer_done_tx, mut writer_done) = oneshot::channel();
    tokio::spawn(write_loop(
        Arc::clone(&conn),
        outbound_rx,
        state.send_timeout,
        writer_done_tx,
    ));

    // If the join fails the queue's sender is dropped here, which stops the
    // writer and closes the socket.
    let room = state
        .hub
        .join(&params.room_id, conn_id, &player, outbound_tx)
        .await?;
    let _guard = MembershipGuard {
        conn_id,
        room: room.clone(),
    };

    tracing::debug!(room_id = %room.room_id(), %conn_id, %player, "connection attached");

    loop {
        let received = tokio::select! {
            received = conn.recv() => received,
            _ = &mut writer_done => {
                tracing::info!(%conn_id, %player, "outbound stopped, dropping connection");
                break;
            }
        };
        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, %player, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, %player, error = %e, "recv error");
                break;
            }
        };

        let event = match decode_event(&state.codec, &data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(
                    %conn_id, %player, error = %e, "failed to decode event"
                );
                continue;
            }
        };

        if let Err(e) = room.submit(conn_id, event).await {
            tracing::warn!(%conn_id, error = %e, "room stopped accepting events");
            break;
        }
    }

    // _guard drops here → leave fires. Once the writer is gone too, the last
    // reference to the socket goes and it is closed.
    Ok(())
}

fn decode_event<C: Codec>(codec: &C, data: &[u8]) -> Result<WireEvent, ProtocolError> {
    let event: WireEvent = codec.decode(data)?;
    event.validate()?;
    Ok(event)
}

/// Writes queued frames to the socket in order. Ends when the room drops
/// the queue's sender, a write fails, or a write takes longer than
/// `send_timeout`. Then closes the connection and tells the receive loop.
async fn write_loop(
    conn: Arc<WebSocketConnection>,
    mut outbound: mpsc::Receiver<Frame>,
    send_timeout: Duration,
    done: oneshot::Sender<()>,
) {
    let conn_id = conn.id();
    while let Some(frame) = outbound.recv().await {
        match tokio::time::timeout(send_timeout, conn.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(%conn_id, error = %e, "send failed");
                break;
            }
            Err(_) => {
                tracing::warn!(%conn_id, ?send_timeout, "send timed out");
                break;
            }
        }
    }
    // Dropping the receiver makes the room's next broadcast to this
    // connection fail, which removes it.
    drop(outbound);
    let _ = done.send(());
    match tokio::time::timeout(send_timeout, conn.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(%conn_id, error = %e, "close failed"),
        Err(_) => tracing::debug!(%conn_id, "close timed out"),
    }
}
