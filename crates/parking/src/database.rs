use std::{error, fmt, result};

use async_trait::async_trait;
use model::{
    zone::{Zone, ZoneId, ZoneRecord},
    Snapshot,
};

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    /// A unique constraint (name or display number) was violated.
    Conflict(String),
    /// The store could not be reached at all.
    Unavailable(Box<dyn error::Error + Send + Sync>),
    Other(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Conflict(why) => write!(f, "conflict: {}", why),
            Self::Unavailable(why) => write!(f, "unavailable: {}", why),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl error::Error for DatabaseError {}

pub type Result<T> = result::Result<T, DatabaseError>;

#[async_trait]
pub trait ZoneRepo {
    /// Returns every zone, ordered by `parking_number` ascending.
    async fn all_zones(&mut self) -> Result<Snapshot>;

    async fn zone_by_id(&mut self, id: ZoneId) -> Result<ZoneRecord>;

    /// Looks a zone up by name, ignoring case.
    async fn zone_by_name(&mut self, name: &str) -> Result<ZoneRecord>;

    async fn zone_by_number(&mut self, parking_number: i32) -> Result<ZoneRecord>;

    /// Smallest display number above every number in use.
    async fn next_parking_number(&mut self) -> Result<i32>;

    /// Inserts a new zone. The store assigns `id` and `updated_at`.
    async fn insert_zone(&mut self, zone: Zone) -> Result<ZoneRecord>;

    /// Replaces the mutable fields of an existing zone and bumps `updated_at`.
    async fn update_zone(&mut self, id: ZoneId, zone: Zone) -> Result<ZoneRecord>;
}

pub trait DatabaseAutocommit: ZoneRepo {}

/// trait to implement a parking zone store.
/// multiple concurrent accesses should be possible by e.g. cloning the database object.
pub trait Database: Clone + Send + Sync + Sized {
    type Autocommit: DatabaseAutocommit + Send;

    fn auto(&self) -> Self::Autocommit;
}
