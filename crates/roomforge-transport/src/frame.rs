//! Outbound frames shared across connections.

use axum::extract::ws::Message;

/// One encoded outbound message, delivered to any number of connections.
///
/// Whether it goes out as a text or a binary WebSocket message is decided
/// once, when the frame is built. Cloning only bumps a reference count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Message);

impl Frame {
    /// Wraps encoded bytes. Valid UTF-8 becomes a text message, anything
    /// else a binary one.
    pub fn new(data: Vec<u8>) -> Self {
        match String::from_utf8(data) {
            Ok(text) => Self(Message::Text(text.into())),
            Err(e) => Self(Message::Binary(e.into_bytes().into())),
        }
    }

    /// Returns `true` if the frame is sent as a text message.
    pub fn is_text(&self) -> bool {
        matches!(self.0, Message::Text(_))
    }

    /// The encoded payload.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Message::Text(text) => text.as_str().as_bytes(),
            Message::Binary(data) => data.as_ref(),
            _ => &[],
        }
    }

    pub(crate) fn into_message(self) -> Message {
        self.0
    }
}

impl From<Vec<u8>> for Frame {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self(Message::Text(text.into()))
    }
}
