use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    zone::{Coordinate, Price, Zone, ZoneId, ZoneRecord, ZoneType},
    Snapshot,
};
use parking::database::ZoneRepo;
use sqlx::{prelude::FromRow, types::Json};

use crate::{queries::zone as queries, PgDatabaseAutocommit};

use super::{corrupt, DatabaseRow, Result};

#[derive(Debug, Clone, FromRow)]
pub struct ZoneRow {
    pub id: i32,
    pub parking_name: String,
    pub parking_number: i32,
    pub empty_spots: i32,
    pub occupied_spots: i32,
    pub total_spots: i32,
    pub price_per_hour: Option<f64>,
    pub schedule: String,
    pub has_surveillance: bool,
    pub has_disabled_access: bool,
    pub has_ev_charging: bool,
    pub zone_type: i16,
    pub coordinates: Json<Vec<Coordinate>>,
    pub updated_at: DateTime<Utc>,
}

fn count(column: &str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| corrupt(format!("{} is negative: {}", column, value)))
}

impl DatabaseRow for ZoneRow {
    type Model = ZoneRecord;

    fn to_model(self) -> Result<Self::Model> {
        Ok(ZoneRecord {
            id: ZoneId(self.id),
            zone: Zone {
                empty_spots: count("empty_spots", self.empty_spots)?,
                occupied_spots: count("occupied_spots", self.occupied_spots)?,
                total_spots: count("total_spots", self.total_spots)?,
                zone_type: ZoneType::try_from(self.zone_type)
                    .map_err(|value| corrupt(format!("unknown zone type {}", value)))?,
                parking_name: self.parking_name,
                parking_number: self.parking_number,
                price_per_hour: Price::from_option(self.price_per_hour),
                schedule: self.schedule,
                has_surveillance: self.has_surveillance,
                has_disabled_access: self.has_disabled_access,
                has_ev_charging: self.has_ev_charging,
                coordinates: self.coordinates.0,
            },
            updated_at: self.updated_at,
        })
    }
}

/// Column values of a zone, converted to their SQL types.
pub struct ZoneValues {
    pub parking_name: String,
    pub parking_number: i32,
    pub empty_spots: i32,
    pub occupied_spots: i32,
    pub total_spots: i32,
    pub price_per_hour: Option<f64>,
    pub schedule: String,
    pub has_surveillance: bool,
    pub has_disabled_access: bool,
    pub has_ev_charging: bool,
    pub zone_type: i16,
    pub coordinates: Json<Vec<Coordinate>>,
}

fn column(name: &str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| corrupt(format!("{} is too large: {}", name, value)))
}

impl ZoneValues {
    pub fn from_model(zone: Zone) -> Result<Self> {
        Ok(Self {
            empty_spots: column("empty_spots", zone.empty_spots)?,
            occupied_spots: column("occupied_spots", zone.occupied_spots)?,
            total_spots: column("total_spots", zone.total_spots)?,
            parking_name: zone.parking_name,
            parking_number: zone.parking_number,
            price_per_hour: zone.price_per_hour.as_option(),
            schedule: zone.schedule,
            has_surveillance: zone.has_surveillance,
            has_disabled_access: zone.has_disabled_access,
            has_ev_charging: zone.has_ev_charging,
            zone_type: zone.zone_type as i16,
            coordinates: Json(zone.coordinates),
        })
    }
}

#[async_trait]
impl ZoneRepo for PgDatabaseAutocommit {
    async fn all_zones(&mut self) -> Result<Snapshot> {
        queries::get_all(&self.pool).await
    }

    async fn zone_by_id(&mut self, id: ZoneId) -> Result<ZoneRecord> {
        queries::get(&self.pool, id).await
    }

    async fn zone_by_name(&mut self, name: &str) -> Result<ZoneRecord> {
        queries::get_by_name(&self.pool, name).await
    }

    async fn zone_by_number(&mut self, parking_number: i32) -> Result<ZoneRecord> {
        queries::get_by_number(&self.pool, parking_number).await
    }

    async fn next_parking_number(&mut self) -> Result<i32> {
        queries::next_parking_number(&self.pool).await
    }

    async fn insert_zone(&mut self, zone: Zone) -> Result<ZoneRecord> {
        queries::insert(&self.pool, ZoneValues::from_model(zone)?).await
    }

    async fn update_zone(&mut self, id: ZoneId, zone: Zone) -> Result<ZoneRecord> {
        queries::update(&self.pool, id, ZoneValues::from_model(zone)?).await
    }
}
