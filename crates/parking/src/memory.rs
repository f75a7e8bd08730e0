//! An in-process zone store. Used by tests and for running the server without
//! a relational database.

use std::{
    error, fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use model::{
    sort_snapshot,
    zone::{Zone, ZoneId, ZoneRecord},
    Snapshot,
};
use tokio::sync::Mutex;

use crate::database::{Database, DatabaseAutocommit, DatabaseError, Result, ZoneRepo};

#[derive(Debug, Default)]
struct Tables {
    zones: Vec<ZoneRecord>,
    last_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    unreachable: Arc<AtomicBool>,
}

#[derive(Debug)]
struct Unreachable;

impl fmt::Display for Unreachable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory store is switched off")
    }
}

impl error::Error for Unreachable {}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: every operation fails with
    /// `DatabaseError::Unavailable` until switched back.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(DatabaseError::Unavailable(Box::new(Unreachable)))
        } else {
            Ok(())
        }
    }
}

/// Unicode case folding, so `Piața` and `PIAȚA` are the same name.
fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn check_unique(zones: &[ZoneRecord], zone: &Zone, except: Option<ZoneId>) -> Result<()> {
    let others = zones.iter().filter(|record| Some(record.id) != except);
    for record in others {
        if same_name(&record.zone.parking_name, &zone.parking_name) {
            return Err(DatabaseError::Conflict(format!(
                "a zone named `{}` already exists",
                zone.parking_name
            )));
        }
        if record.zone.parking_number == zone.parking_number {
            return Err(DatabaseError::Conflict(format!(
                "parking number {} is already taken",
                zone.parking_number
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl ZoneRepo for MemoryDatabase {
    async fn all_zones(&mut self) -> Result<Snapshot> {
        self.check_reachable()?;
        let mut snapshot = self.tables.lock().await.zones.clone();
        sort_snapshot(&mut snapshot);
        Ok(snapshot)
    }

    async fn zone_by_id(&mut self, id: ZoneId) -> Result<ZoneRecord> {
        self.check_reachable()?;
        self.tables
            .lock()
            .await
            .zones
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn zone_by_name(&mut self, name: &str) -> Result<ZoneRecord> {
        self.check_reachable()?;
        self.tables
            .lock()
            .await
            .zones
            .iter()
            .find(|record| same_name(&record.zone.parking_name, name))
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn zone_by_number(&mut self, parking_number: i32) -> Result<ZoneRecord> {
        self.check_reachable()?;
        self.tables
            .lock()
            .await
            .zones
            .iter()
            .find(|record| record.zone.parking_number == parking_number)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn next_parking_number(&mut self) -> Result<i32> {
        self.check_reachable()?;
        let tables = self.tables.lock().await;
        let highest = tables
            .zones
            .iter()
            .map(|record| record.zone.parking_number)
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }

    async fn insert_zone(&mut self, zone: Zone) -> Result<ZoneRecord> {
        self.check_reachable()?;
        let mut tables = self.tables.lock().await;
        check_unique(&tables.zones, &zone, None)?;
        tables.last_id += 1;
        let record = ZoneRecord {
            id: ZoneId(tables.last_id),
            zone,
            updated_at: Utc::now(),
        };
        tables.zones.push(record.clone());
        Ok(record)
    }

    async fn update_zone(&mut self, id: ZoneId, zone: Zone) -> Result<ZoneRecord> {
        self.check_reachable()?;
        let mut tables = self.tables.lock().await;
        check_unique(&tables.zones, &zone, Some(id))?;
        let record = tables
            .zones
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(DatabaseError::NotFound)?;
        record.zone = zone;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

impl DatabaseAutocommit for MemoryDatabase {}

impl Database for MemoryDatabase {
    type Autocommit = MemoryDatabase;

    fn auto(&self) -> Self::Autocommit {
        self.clone()
    }
}
