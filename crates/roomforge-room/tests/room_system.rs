//! Integration tests for the hub, room actors and standard handlers.

use std::sync::Arc;
use std::time::Duration;

use roomforge_protocol::WireEvent;
use roomforge_room::{Frame, Hub, RoomConfig};
use roomforge_transport::ConnectionId;
use serde_json::{Value, json};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn cid(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn event(kind: &str, room_id: &str, payload: Value) -> WireEvent {
    WireEvent {
        kind: kind.into(),
        room_id: room_id.into(),
        payload,
    }
}

/// Receives the next frame and decodes it, failing the test after a second.
async fn next_event(rx: &mut mpsc::Receiver<Frame>) -> WireEvent {
    let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("outbound queue closed");
    serde_json::from_slice(frame.as_bytes()).expect("frame is a wire event")
}

/// Drains whatever is already queued.
fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<WireEvent> {
    let mut events = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        events.push(serde_json::from_slice(frame.as_bytes()).unwrap());
    }
    events
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_concurrent_resolve_or_create_converges() {
    let hub = Arc::new(Hub::default());

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move { hub.resolve_or_create("busy").await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap());
    }

    assert_eq!(hub.room_count().await, 1);
    assert!(handles.iter().all(|h| h.same_room(&handles[0])));
}

#[tokio::test]
async fn test_concurrent_joins_are_not_lost() {
    let hub = Arc::new(Hub::default());
    let mut receivers = Vec::new();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let hub = Arc::clone(&hub);
            let (tx, rx) = mpsc::channel(64);
            receivers.push(rx);
            tokio::spawn(async move {
                hub.join("party", cid(i), &format!("p{i}"), tx).await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let snapshot = hub.resolve("party").await.unwrap().snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 16);
    assert_eq!(snapshot.connection_count(), 16);
}

#[tokio::test]
async fn test_join_existing_after_create() {
    let hub = Hub::default();
    let (tx1, _rx1) = mpsc::channel(8);
    let (tx2, mut rx2) = mpsc::channel(8);

    hub.join("table", cid(1), "alice", tx1).await.unwrap();
    hub.join_existing("table", cid(2), "bob", tx2).await.unwrap();

    assert_eq!(next_event(&mut rx2).await.payload, json!({"player": "bob"}));
}

// =========================================================================
// Broadcast
// =========================================================================

#[tokio::test]
async fn test_join_is_announced_to_everyone() {
    let hub = Hub::default();
    let (tx1, mut rx1) = mpsc::channel(8);
    let (tx2, mut rx2) = mpsc::channel(8);

    hub.join("table", cid(1), "alice", tx1).await.unwrap();
    hub.join("table", cid(2), "bob", tx2).await.unwrap();

    let alice_sees: Vec<Value> = drain(&mut rx1).into_iter().map(|e| e.payload).collect();
    assert_eq!(alice_sees, [json!({"player": "alice"}), json!({"player": "bob"})]);

    let bob_sees = drain(&mut rx2);
    assert_eq!(bob_sees.len(), 1);
    assert_eq!(bob_sees[0].kind, "PLAYER_JOINED");
    assert_eq!(bob_sees[0].room_id, "table");
}

#[tokio::test]
async fn test_fan_out_preserves_order_per_connection() {
    let hub = Hub::default();
    let (tx1, mut rx1) = mpsc::channel(64);
    let (tx2, mut rx2) = mpsc::channel(64);
    let room = hub.join("table", cid(1), "alice", tx1).await.unwrap();
    hub.join("table", cid(2), "bob", tx2).await.unwrap();
    drain(&mut rx1);
    drain(&mut rx2);

    for n in 1..=5 {
        room.submit(
            cid(1),
            event("ROLL_DICE", "table", json!({"player": "alice", "diceValue": n})),
        )
        .await
        .unwrap();
    }
    room.snapshot().await.unwrap();

    for rx in [&mut rx1, &mut rx2] {
        let values: Vec<Value> = drain(rx)
            .into_iter()
            .map(|e| e.payload["diceValue"].clone())
            .collect();
        assert_eq!(values, [json!(1), json!(2), json!(3), json!(4), json!(5)]);
    }
}

#[tokio::test]
async fn test_closed_connection_is_removed_and_others_still_receive() {
    let hub = Hub::default();
    let (tx1, rx1) = mpsc::channel(8);
    let (tx2, mut rx2) = mpsc::channel(8);
    let room = hub.join("table", cid(1), "alice", tx1).await.unwrap();
    hub.join("table", cid(2), "bob", tx2).await.unwrap();
    drain(&mut rx2);

    // Alice's socket is gone.
    drop(rx1);

    room.submit(cid(2), event("END_TURN", "table", Value::Null))
        .await
        .unwrap();

    assert_eq!(next_event(&mut rx2).await.payload, json!({"nextTurn": "bob"}));

    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.connected, ["bob"]);
    assert!(snapshot.player("alice").is_some());
    // Leaving afterwards is a harmless no-op.
    assert!(!room.leave(cid(1)).await.unwrap());
}

// =========================================================================
// Handlers through the room
// =========================================================================

#[tokio::test]
async fn test_end_turn_alternates_between_two_players() {
    let hub = Hub::default();
    let (tx1, mut rx1) = mpsc::channel(16);
    let (tx2, _rx2) = mpsc::channel(16);
    let room = hub.join("table", cid(1), "alice", tx1).await.unwrap();
    hub.join("table", cid(2), "bob", tx2).await.unwrap();
    drain(&mut rx1);

    let mut holders = Vec::new();
    for _ in 0..3 {
        room.submit(cid(1), event("END_TURN", "table", Value::Null))
            .await
            .unwrap();
        let announced = next_event(&mut rx1).await;
        assert_eq!(announced.kind, "END_TURN");
        holders.push(announced.payload["nextTurn"].as_str().unwrap().to_string());
    }

    assert_eq!(holders, ["bob", "alice", "bob"]);
}

#[tokio::test]
async fn test_dice_roll_moves_player_and_is_echoed() {
    let hub = Hub::default();
    let (tx, mut rx) = mpsc::channel(8);
    let room = hub.join("table", cid(1), "alice", tx).await.unwrap();
    drain(&mut rx);

    let roll = event("ROLL_DICE", "table", json!({"player": "alice", "diceValue": 5}));
    room.submit(cid(1), roll.clone()).await.unwrap();

    assert_eq!(next_event(&mut rx).await, roll);
    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.player("alice").unwrap().position, 5);
}

#[tokio::test]
async fn test_malformed_roll_changes_nothing_and_keeps_connection() {
    let hub = Hub::default();
    let (tx, mut rx) = mpsc::channel(8);
    let room = hub.join("table", cid(1), "alice", tx).await.unwrap();
    drain(&mut rx);

    room.submit(
        cid(1),
        event("ROLL_DICE", "table", json!({"player": "alice", "diceValue": "five"})),
    )
    .await
    .unwrap();
    room.submit(cid(1), event("TRADE", "table", json!({}))).await.unwrap();

    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.player("alice").unwrap().position, 0);
    assert_eq!(snapshot.connected, ["alice"]);
    assert!(drain(&mut rx).is_empty(), "no reply to rejected events");

    // The connection is still usable.
    room.submit(
        cid(1),
        event("ROLL_DICE", "table", json!({"player": "alice", "diceValue": 2})),
    )
    .await
    .unwrap();
    assert_eq!(next_event(&mut rx).await.payload["diceValue"], 2);
}

#[tokio::test]
async fn test_buy_property_is_recorded() {
    let hub = Hub::default();
    let (tx, _rx) = mpsc::channel(8);
    let room = hub.join("table", cid(1), "bob", tx).await.unwrap();

    room.submit(
        cid(1),
        event("BUY_PROPERTY", "table", json!({"player": "bob", "propertyId": "park-place"})),
    )
    .await
    .unwrap();

    let bob = room.snapshot().await.unwrap().player("bob").cloned().unwrap();
    assert_eq!(bob.properties, ["park-place"]);
    assert_eq!(bob.balance, 1500);
}

// =========================================================================
// Membership
// =========================================================================

#[tokio::test]
async fn test_leave_keeps_player_state_for_rejoin() {
    let hub = Hub::default();
    let (tx, _rx) = mpsc::channel(8);
    let room = hub.join("table", cid(1), "alice", tx).await.unwrap();
    room.submit(
        cid(1),
        event("ROLL_DICE", "table", json!({"player": "alice", "diceValue": 7})),
    )
    .await
    .unwrap();

    assert!(room.leave(cid(1)).await.unwrap());
    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.connection_count(), 0);
    assert_eq!(snapshot.player("alice").unwrap().position, 7);

    let (tx, _rx) = mpsc::channel(8);
    hub.join("table", cid(2), "alice", tx).await.unwrap();
    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.player("alice").unwrap().position, 7);
}

#[tokio::test]
async fn test_custom_starting_balance() {
    let hub = Hub::new(RoomConfig {
        starting_balance: 200,
        ..RoomConfig::default()
    });
    let (tx, _rx) = mpsc::channel(8);
    let room = hub.join("table", cid(1), "alice", tx).await.unwrap();

    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.player("alice").unwrap().balance, 200);
}
