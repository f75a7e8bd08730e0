use std::{error::Error, fmt};

use model::zone::ValidationError;
use tokio::sync::{mpsc, oneshot};

pub mod broadcaster;
pub mod client;
pub mod collector;
pub mod database;
pub mod memory;
pub mod registry;
pub mod server;

#[derive(Debug)]
pub enum RequestError {
    NotFound,
    Conflict(String),
    Invalid(ValidationError),
    Unavailable(Box<dyn Error + Send + Sync>),
    /// The broadcaster task is gone, e.g. after shutdown.
    BroadcasterGone,
    Other(Box<dyn Error + Send + Sync>),
}

impl RequestError {
    pub fn other<T: Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Conflict(why) => write!(f, "conflict: {}", why),
            Self::Invalid(why) => write!(f, "{}", why),
            Self::Unavailable(why) => write!(f, "store unavailable: {}", why),
            Self::BroadcasterGone => write!(f, "snapshot broadcaster is not running"),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl Error for RequestError {}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => Self::NotFound,
            database::DatabaseError::Conflict(why) => Self::Conflict(why),
            database::DatabaseError::Unavailable(why) => Self::Unavailable(why),
            database::DatabaseError::Other(why) => Self::Other(why),
        }
    }
}

impl From<ValidationError> for RequestError {
    fn from(why: ValidationError) -> Self {
        Self::Invalid(why)
    }
}

impl From<mpsc::error::SendError<broadcaster::Command>> for RequestError {
    fn from(_: mpsc::error::SendError<broadcaster::Command>) -> Self {
        Self::BroadcasterGone
    }
}

impl From<oneshot::error::RecvError> for RequestError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::BroadcasterGone
    }
}

pub type RequestResult<O> = Result<O, RequestError>;
