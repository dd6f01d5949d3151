//! The standard event handlers: dice rolls, property purchases, turn ends.
//!
//! These are bookkeeping only. Landing effects, rent, and balance checks are
//! not modelled; a client that wants them implements another
//! [`EventHandler`] and registers it on the [`Dispatcher`](crate::Dispatcher).

use roomforge_protocol::{BuyProperty, EventKind, RollDice, TurnChanged, WireEvent};

use crate::{DispatchError, EventHandler, GameState};

/// Re-broadcasts the inbound event unchanged, stamped with the room id.
fn echo(state: &GameState, event: &WireEvent) -> WireEvent {
    WireEvent {
        kind: event.kind.clone(),
        room_id: state.room_id().to_string(),
        payload: event.payload.clone(),
    }
}

/// `ROLL_DICE {player, diceValue}`: moves the player and echoes the roll.
#[derive(Debug, Clone, Copy)]
pub struct RollDiceHandler {
    board_size: u32,
}

impl RollDiceHandler {
    /// A handler for a board with `board_size` tiles (at least one).
    pub fn new(board_size: u32) -> Self {
        Self {
            board_size: board_size.max(1),
        }
    }
}

impl EventHandler for RollDiceHandler {
    fn handle(
        &self,
        state: &mut GameState,
        event: &WireEvent,
    ) -> Result<Option<WireEvent>, DispatchError> {
        let roll: RollDice = event
            .payload_as()
            .map_err(|e| DispatchError::malformed(EventKind::RollDice, e))?;
        if roll.dice_value == 0 {
            return Err(DispatchError::malformed(
                EventKind::RollDice,
                "diceValue must be positive",
            ));
        }

        let player = state
            .player_mut(&roll.player)
            .ok_or_else(|| DispatchError::UnknownPlayer(roll.player.clone()))?;
        let advanced = u64::from(player.position) + u64::from(roll.dice_value);
        // Remainder is below board_size, so it fits back into u32.
        player.position = (advanced % u64::from(self.board_size)) as u32;

        Ok(Some(echo(state, event)))
    }
}

/// `BUY_PROPERTY {player, propertyId}`: records ownership and echoes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyPropertyHandler;

impl EventHandler for BuyPropertyHandler {
    fn handle(
        &self,
        state: &mut GameState,
        event: &WireEvent,
    ) -> Result<Option<WireEvent>, DispatchError> {
        let purchase: BuyProperty = event
            .payload_as()
            .map_err(|e| DispatchError::malformed(EventKind::BuyProperty, e))?;

        let player = state
            .player_mut(&purchase.player)
            .ok_or_else(|| DispatchError::UnknownPlayer(purchase.player.clone()))?;
        player.properties.push(purchase.property_id);

        Ok(Some(echo(state, event)))
    }
}

/// `END_TURN`: passes the turn on and announces the new holder.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndTurnHandler;

impl EventHandler for EndTurnHandler {
    fn handle(
        &self,
        state: &mut GameState,
        _event: &WireEvent,
    ) -> Result<Option<WireEvent>, DispatchError> {
        let Some(next_turn) = state.advance_turn().map(str::to_string) else {
            return Ok(None);
        };
        let announcement = WireEvent::new(
            EventKind::EndTurn,
            state.room_id(),
            &TurnChanged { next_turn },
        )?;
        Ok(Some(announcement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_with(names: &[&str]) -> GameState {
        let mut state = GameState::new("table-1");
        for name in names {
            state.add_player(name, 1500);
        }
        state
    }

    fn event(kind: &str, payload: serde_json::Value) -> WireEvent {
        WireEvent {
            kind: kind.into(),
            room_id: "table-1".into(),
            payload,
        }
    }

    #[test]
    fn test_roll_dice_moves_player_and_echoes_verbatim() {
        let mut state = state_with(&["alice"]);
        let inbound = event("ROLL_DICE", json!({"player": "alice", "diceValue": 5}));

        let out = RollDiceHandler::new(40)
            .handle(&mut state, &inbound)
            .unwrap()
            .expect("roll is echoed");

        assert_eq!(state.player("alice").unwrap().position, 5);
        assert_eq!(out.kind, "ROLL_DICE");
        assert_eq!(out.payload, json!({"player": "alice", "diceValue": 5}));
    }

    #[test]
    fn test_roll_dice_wraps_around_board() {
        let mut state = state_with(&["alice"]);
        state.player_mut("alice").unwrap().position = 38;

        RollDiceHandler::new(40)
            .handle(&mut state, &event("ROLL_DICE", json!({"player": "alice", "diceValue": 5})))
            .unwrap();

        assert_eq!(state.player("alice").unwrap().position, 3);
    }

    #[test]
    fn test_roll_dice_mistyped_value_leaves_state() {
        let mut state = state_with(&["alice"]);
        let result = RollDiceHandler::new(40).handle(
            &mut state,
            &event("ROLL_DICE", json!({"player": "alice", "diceValue": "five"})),
        );

        assert!(matches!(
            result,
            Err(DispatchError::MalformedPayload { kind: EventKind::RollDice, .. })
        ));
        assert_eq!(state.player("alice").unwrap().position, 0);
    }

    #[test]
    fn test_roll_dice_rejects_zero_and_negative() {
        let mut state = state_with(&["alice"]);
        let handler = RollDiceHandler::new(40);
        for value in [json!(0), json!(-3)] {
            let result = handler.handle(
                &mut state,
                &event("ROLL_DICE", json!({"player": "alice", "diceValue": value})),
            );
            assert!(matches!(result, Err(DispatchError::MalformedPayload { .. })));
        }
        assert_eq!(state.player("alice").unwrap().position, 0);
    }

    #[test]
    fn test_roll_dice_accepts_whole_float() {
        let mut state = state_with(&["alice"]);
        let handler = RollDiceHandler::new(40);
        handler
            .handle(
                &mut state,
                &event("ROLL_DICE", json!({"player": "alice", "diceRoll": 5.0})),
            )
            .unwrap();
        assert_eq!(state.player("alice").unwrap().position, 5);
    }

    #[test]
    fn test_roll_dice_unknown_player() {
        let mut state = state_with(&["alice"]);
        let result = RollDiceHandler::new(40).handle(
            &mut state,
            &event("ROLL_DICE", json!({"player": "eve", "diceValue": 2})),
        );
        assert!(matches!(result, Err(DispatchError::UnknownPlayer(p)) if p == "eve"));
    }

    #[test]
    fn test_buy_property_appends_without_uniqueness_check() {
        let mut state = state_with(&["bob"]);
        let handler = BuyPropertyHandler;
        let buy = event("BUY_PROPERTY", json!({"player": "bob", "propertyId": "park-place"}));

        handler.handle(&mut state, &buy).unwrap();
        let out = handler.handle(&mut state, &buy).unwrap().unwrap();

        assert_eq!(
            state.player("bob").unwrap().properties,
            ["park-place", "park-place"]
        );
        assert_eq!(state.player("bob").unwrap().balance, 1500);
        assert_eq!(out.payload, buy.payload);
    }

    #[test]
    fn test_buy_property_accepts_legacy_field() {
        let mut state = state_with(&["bob"]);
        BuyPropertyHandler
            .handle(
                &mut state,
                &event("BUY_PROPERTY", json!({"player": "bob", "property": "boardwalk"})),
            )
            .unwrap();
        assert_eq!(state.player("bob").unwrap().properties, ["boardwalk"]);
    }

    #[test]
    fn test_buy_property_missing_field_is_malformed() {
        let mut state = state_with(&["bob"]);
        let result =
            BuyPropertyHandler.handle(&mut state, &event("BUY_PROPERTY", json!({"player": "bob"})));
        assert!(matches!(result, Err(DispatchError::MalformedPayload { .. })));
        assert!(state.player("bob").unwrap().properties.is_empty());
    }

    #[test]
    fn test_end_turn_announces_next_holder() {
        let mut state = state_with(&["alice", "bob"]);

        let out = EndTurnHandler
            .handle(&mut state, &event("END_TURN", serde_json::Value::Null))
            .unwrap()
            .unwrap();

        assert_eq!(state.current_turn(), Some("bob"));
        assert_eq!(out.kind, "END_TURN");
        assert_eq!(out.room_id, "table-1");
        assert_eq!(out.payload, json!({"nextTurn": "bob"}));
    }

    #[test]
    fn test_end_turn_in_empty_room_is_silent() {
        let mut state = state_with(&[]);
        let out = EndTurnHandler
            .handle(&mut state, &event("END_TURN", serde_json::Value::Null))
            .unwrap();
        assert!(out.is_none());
    }
}
