//! Join parameters carried on the upgrade request's query string.

use serde::Deserialize;

use crate::TransportError;

/// The room a connection wants to join and the name it plays under.
///
/// Both fields are guaranteed non-empty once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    /// Target room identifier.
    pub room_id: String,
    /// Player name, unique within the room.
    pub player_name: String,
}

impl JoinParams {
    /// Builds join parameters, rejecting empty values.
    pub fn new(
        room_id: impl Into<String>,
        player_name: impl Into<String>,
    ) -> Result<Self, TransportError> {
        let room_id = room_id.into();
        let player_name = player_name.into();
        if room_id.trim().is_empty() {
            return Err(TransportError::InvalidJoinParams(
                "missing room id".into(),
            ));
        }
        if player_name.trim().is_empty() {
            return Err(TransportError::InvalidJoinParams(
                "missing player name".into(),
            ));
        }
        Ok(Self {
            room_id,
            player_name,
        })
    }
}

/// Raw query string of an upgrade request, as extracted by the router.
///
/// `roomId` wins over `gameId` and `playerName` over `name`; an empty value
/// counts as absent.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct JoinQuery {
    #[serde(rename = "roomId")]
    room_id: Option<String>,
    #[serde(rename = "gameId")]
    game_id: Option<String>,
    #[serde(rename = "playerName")]
    player_name: Option<String>,
    name: Option<String>,
}

impl TryFrom<JoinQuery> for JoinParams {
    type Error = TransportError;

    fn try_from(query: JoinQuery) -> Result<Self, Self::Error> {
        let first = |a: Option<String>, b: Option<String>| {
            a.filter(|v| !v.is_empty())
                .or(b.filter(|v| !v.is_empty()))
                .unwrap_or_default()
        };
        Self::new(
            first(query.room_id, query.game_id),
            first(query.player_name, query.name),
        )
    }
}
