//! Core protocol types for Roomforge's wire format.
//!
//! Every message in either direction is a [`WireEvent`]: a kind string, the
//! room it belongs to, and a kind-specific payload. The payload stays an
//! untyped JSON value on the wire so that unknown kinds can still be parsed
//! (and then dropped by the dispatcher); each known kind has a typed payload
//! struct that is validated when the event is handled.

use std::fmt;
use std::str::FromStr;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The event kinds the server understands.
///
/// On the wire these are SCREAMING_SNAKE_CASE strings (`"ROLL_DICE"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Client → room: a player rolled the dice. Echoed to everyone.
    RollDice,
    /// Client → room: a player bought a property. Echoed to everyone.
    BuyProperty,
    /// Client → room: the turn is over. Answered with the next turn holder.
    EndTurn,
    /// Room → clients: a player joined the room.
    PlayerJoined,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 4] = [
        Self::RollDice,
        Self::BuyProperty,
        Self::EndTurn,
        Self::PlayerJoined,
    ];

    /// The wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RollDice => "ROLL_DICE",
            Self::BuyProperty => "BUY_PROPERTY",
            Self::EndTurn => "END_TURN",
            Self::PlayerJoined => "PLAYER_JOINED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownKind(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// WireEvent: the only message shape on the wire
// ---------------------------------------------------------------------------

/// A kind-tagged event, inbound or outbound.
///
/// ```text
/// { "kind": "ROLL_DICE", "roomId": "table-1", "payload": { "player": "alice", "diceValue": 5 } }
/// ```
///
/// Older clients send `event`/`gameId` instead of `kind`/`roomId`; both
/// spellings are accepted on input, the canonical one is always written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    /// The event kind as sent. Kept as a string so unknown kinds still parse.
    #[serde(alias = "event")]
    pub kind: String,

    /// The room this event belongs to.
    #[serde(rename = "roomId", alias = "gameId", default)]
    pub room_id: String,

    /// Kind-specific data. `null` when the kind carries none.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WireEvent {
    /// Builds an outbound event from a typed payload.
    pub fn new<P: Serialize>(
        kind: EventKind,
        room_id: impl Into<String>,
        payload: &P,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind: kind.as_str().to_string(),
            room_id: room_id.into(),
            payload: serde_json::to_value(payload)
                .map_err(ProtocolError::Encode)?,
        })
    }

    /// Checks the envelope rules that serde alone can't express: the kind
    /// is non-blank and the payload, when present, is a JSON object.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.kind.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage("empty event kind".into()));
        }
        if !(self.payload.is_object() || self.payload.is_null()) {
            return Err(ProtocolError::InvalidMessage(format!(
                "{} payload must be an object",
                self.kind
            )));
        }
        Ok(())
    }

    /// Resolves the kind string to a known [`EventKind`].
    pub fn event_kind(&self) -> Result<EventKind, ProtocolError> {
        self.kind.parse()
    }

    /// Decodes the payload into the typed shape for this kind.
    ///
    /// Missing or mistyped fields are reported as
    /// [`ProtocolError::Decode`]; the event itself is left untouched.
    pub fn payload_as<P: DeserializeOwned>(&self) -> Result<P, ProtocolError> {
        P::deserialize(&self.payload).map_err(ProtocolError::Decode)
    }
}

// ---------------------------------------------------------------------------
// Typed payloads
// ---------------------------------------------------------------------------

/// Payload of `ROLL_DICE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollDice {
    /// The player who rolled.
    pub player: String,
    /// The rolled value. Older clients call it `diceRoll`, and some send it
    /// as a float (`5.0`); any whole number is accepted.
    #[serde(alias = "diceRoll", deserialize_with = "whole_number")]
    pub dice_value: u32,
}

fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&value) {
        return Err(D::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        )));
    }
    Ok(value as u32)
}

/// Payload of `BUY_PROPERTY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyProperty {
    /// The buying player.
    pub player: String,
    /// The property bought. Older clients call it `property`.
    #[serde(alias = "property")]
    pub property_id: String,
}

/// Payload of the `END_TURN` event the room sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnChanged {
    /// Name of the player whose turn it is now.
    pub next_turn: String,
}

/// Payload of `PLAYER_JOINED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoined {
    /// The joining player's name.
    pub player: String,
}

// =========================================================================
// Tests
// =========================================================================
