//! Routes inbound events to the handler registered for their kind.
//!
//! Handlers are the extension point of the room layer: the dispatcher knows
//! nothing about dice or properties, it only maps an [`EventKind`] to an
//! [`EventHandler`] and hands it the room's state.

use std::collections::HashMap;

use roomforge_protocol::{EventKind, WireEvent};

use crate::handlers::{BuyPropertyHandler, EndTurnHandler, RollDiceHandler};
use crate::{DispatchError, GameState, RoomConfig};

/// Handles one kind of inbound event.
///
/// Called from inside the room actor, so `state` is never observed by anyone
/// else while the handler runs. A handler must validate its payload before
/// mutating anything: returning `Err` has to leave `state` as it found it.
///
/// The returned event, if any, is broadcast to every connection in the room.
pub trait EventHandler: Send + Sync + 'static {
    /// Applies `event` to `state`.
    fn handle(
        &self,
        state: &mut GameState,
        event: &WireEvent,
    ) -> Result<Option<WireEvent>, DispatchError>;
}

/// Maps event kinds to their handlers.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<EventKind, Box<dyn EventHandler>>,
}

impl Dispatcher {
    /// A dispatcher with no handlers; every event is an unknown kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// The dice / property / turn handlers.
    pub fn standard(config: &RoomConfig) -> Self {
        Self::new()
            .with_handler(
                EventKind::RollDice,
                RollDiceHandler::new(config.board_size),
            )
            .with_handler(EventKind::BuyProperty, BuyPropertyHandler)
            .with_handler(EventKind::EndTurn, EndTurnHandler)
    }

    /// Registers `handler` for `kind`, replacing any previous one.
    pub fn with_handler(
        mut self,
        kind: EventKind,
        handler: impl EventHandler,
    ) -> Self {
        self.handlers.insert(kind, Box::new(handler));
        self
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Routes `event` to its handler.
    ///
    /// # Errors
    /// [`DispatchError::UnknownEventKind`] when the kind string is not a
    /// known [`EventKind`] or nothing is registered for it; otherwise
    /// whatever the handler reports.
    pub fn dispatch(
        &self,
        state: &mut GameState,
        event: &WireEvent,
    ) -> Result<Option<WireEvent>, DispatchError> {
        let handler = event
            .event_kind()
            .ok()
            .and_then(|kind| self.handlers.get(&kind))
            .ok_or_else(|| DispatchError::UnknownEventKind(event.kind.clone()))?;
        handler.handle(state, event)
    }
}
