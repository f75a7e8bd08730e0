use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Snapshot;

/// The only message a viewer sends over the persistent channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Ping,
}

impl ClientMessage {
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        serde_json::from_str(text).map_err(MessageError::Json)
    }
}

pub const PING: &str = r#"{"type":"ping"}"#;
pub const PONG: &str = r#"{"type":"pong"}"#;

/// What a viewer can receive: a full snapshot (bare JSON array) or a tagged
/// control object.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Snapshot(Snapshot),
    Pong,
    /// Tagged with a type this viewer does not handle.
    Other(String),
}

impl ServerMessage {
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        match serde_json::from_str::<Value>(text).map_err(MessageError::Json)? {
            value @ Value::Array(_) => serde_json::from_value(value)
                .map(ServerMessage::Snapshot)
                .map_err(MessageError::Json),
            Value::Object(object) => match object.get("type").and_then(Value::as_str) {
                Some("pong") => Ok(ServerMessage::Pong),
                Some(other) => Ok(ServerMessage::Other(other.to_owned())),
                None => Err(MessageError::Untagged),
            },
            _ => Err(MessageError::Untagged),
        }
    }
}

#[derive(Debug)]
pub enum MessageError {
    Json(serde_json::Error),
    Untagged,
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed message: {}", e),
            Self::Untagged => write!(f, "message is neither a snapshot nor tagged"),
        }
    }
}

impl std::error::Error for MessageError {}
