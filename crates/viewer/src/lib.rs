use std::{error, fmt};

use model::message::MessageError;
use tokio::time::error::Elapsed;

pub mod channel;
pub mod config;
pub mod notification;
pub mod poller;
pub mod reconciler;
pub mod session;

#[derive(Debug)]
pub enum ViewerError {
    Http(reqwest::Error),
    WebSocket(tokio_tungstenite::tungstenite::Error),
    /// The live channel did not open in time.
    ConnectTimeout(Elapsed),
    Message(MessageError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "snapshot request failed: {}", e),
            Self::WebSocket(e) => write!(f, "live channel failed: {}", e),
            Self::ConnectTimeout(_) => write!(f, "live channel did not open in time"),
            Self::Message(e) => write!(f, "{}", e),
        }
    }
}

impl error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::WebSocket(e) => Some(e),
            Self::ConnectTimeout(e) => Some(e),
            Self::Message(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for ViewerError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ViewerError {
    fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(value)
    }
}

impl From<Elapsed> for ViewerError {
    fn from(value: Elapsed) -> Self {
        Self::ConnectTimeout(value)
    }
}

impl From<MessageError> for ViewerError {
    fn from(value: MessageError) -> Self {
        Self::Message(value)
    }
}
