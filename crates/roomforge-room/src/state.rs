//! Per-room game bookkeeping: players and whose turn it is.
//!
//! `GameState` is owned by exactly one room actor and only ever mutated from
//! inside it, so it needs no locking of its own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One player's accumulated state within a room.
///
/// Created the first time a name joins the room and kept for the room's
/// lifetime, even after that player's connection goes away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Player name, unique within the room.
    pub name: String,
    /// Currency on hand.
    pub balance: i64,
    /// Tile index on the board.
    pub position: u32,
    /// Properties bought, in purchase order.
    pub properties: Vec<String>,
    /// Turns left to sit out in jail.
    pub jail_turns: u32,
}

impl PlayerState {
    /// A fresh player at the start tile.
    pub fn new(name: impl Into<String>, balance: i64) -> Self {
        Self {
            name: name.into(),
            balance,
            position: 0,
            properties: Vec::new(),
            jail_turns: 0,
        }
    }
}

/// Everything a room knows about its game.
///
/// Invariants:
/// - `turn_order` holds exactly the keys of `players`, in join order.
/// - `current_turn` is `None` iff there are no players, otherwise it names
///   a key of `players`.
#[derive(Debug, Clone)]
pub struct GameState {
    room_id: String,
    players: HashMap<String, PlayerState>,
    turn_order: Vec<String>,
    current_turn: Option<String>,
}

impl GameState {
    /// An empty game for the given room.
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            players: HashMap::new(),
            turn_order: Vec::new(),
            current_turn: None,
        }
    }

    /// The room this state belongs to.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Registers a player if the name is new. Returns `true` when a fresh
    /// `PlayerState` was created; an existing one is left untouched.
    ///
    /// The first player to join holds the first turn.
    pub fn add_player(&mut self, name: &str, starting_balance: i64) -> bool {
        if self.players.contains_key(name) {
            return false;
        }
        self.players
            .insert(name.to_string(), PlayerState::new(name, starting_balance));
        self.turn_order.push(name.to_string());
        if self.current_turn.is_none() {
            self.current_turn = Some(name.to_string());
        }
        true
    }

    /// Looks up a player by name.
    pub fn player(&self, name: &str) -> Option<&PlayerState> {
        self.players.get(name)
    }

    /// Mutable access to a player, for event handlers.
    pub fn player_mut(&mut self, name: &str) -> Option<&mut PlayerState> {
        self.players.get_mut(name)
    }

    /// Players in join order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.turn_order
            .iter()
            .filter_map(|name| self.players.get(name))
    }

    /// Number of players with state in this room.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The current turn holder, if any player exists.
    pub fn current_turn(&self) -> Option<&str> {
        self.current_turn.as_deref()
    }

    /// Passes the turn to the next player in join order, wrapping around.
    ///
    /// With a single player the holder stays the same; with two or more the
    /// new holder always differs from the previous one. Returns the new
    /// holder, or `None` when the room has no players.
    pub fn advance_turn(&mut self) -> Option<&str> {
        let current = self.current_turn.as_deref()?;
        let index = self
            .turn_order
            .iter()
            .position(|name| name == current)
            .unwrap_or(0);
        let next = (index + 1) % self.turn_order.len();
        self.current_turn = self.turn_order.get(next).cloned();
        self.current_turn.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_player_initializes_defaults() {
        let mut state = GameState::new("r");
        assert!(state.add_player("alice", 1500));

        let alice = state.player("alice").unwrap();
        assert_eq!(alice.balance, 1500);
        assert_eq!(alice.position, 0);
        assert!(alice.properties.is_empty());
        assert_eq!(alice.jail_turns, 0);
    }

    #[test]
    fn test_add_player_keeps_existing_state() {
        let mut state = GameState::new("r");
        state.add_player("alice", 1500);
        state.player_mut("alice").unwrap().position = 12;

        assert!(!state.add_player("alice", 1500));
        assert_eq!(state.player("alice").unwrap().position, 12);
        assert_eq!(state.player_count(), 1);
    }

    #[test]
    fn test_first_player_holds_turn() {
        let mut state = GameState::new("r");
        assert_eq!(state.current_turn(), None);
        state.add_player("alice", 0);
        state.add_player("bob", 0);
        assert_eq!(state.current_turn(), Some("alice"));
    }

    #[test]
    fn test_advance_turn_two_players_alternates() {
        let mut state = GameState::new("r");
        state.add_player("alice", 0);
        state.add_player("bob", 0);

        assert_eq!(state.advance_turn(), Some("bob"));
        assert_eq!(state.advance_turn(), Some("alice"));
        assert_eq!(state.advance_turn(), Some("bob"));
    }

    #[test]
    fn test_advance_turn_round_robin_in_join_order() {
        let mut state = GameState::new("r");
        for name in ["carol", "alice", "bob"] {
            state.add_player(name, 0);
        }
        let order: Vec<String> = (0..4)
            .filter_map(|_| state.advance_turn().map(str::to_string))
            .collect();
        assert_eq!(order, ["alice", "bob", "carol", "alice"]);
    }

    #[test]
    fn test_advance_turn_single_player_unchanged() {
        let mut state = GameState::new("r");
        state.add_player("alice", 0);
        assert_eq!(state.advance_turn(), Some("alice"));
    }

    #[test]
    fn test_advance_turn_empty_room() {
        let mut state = GameState::new("r");
        assert_eq!(state.advance_turn(), None);
    }

    #[test]
    fn test_players_iterates_in_join_order() {
        let mut state = GameState::new("r");
        state.add_player("zed", 0);
        state.add_player("amy", 0);
        let names: Vec<&str> = state.players().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["zed", "amy"]);
    }
}
