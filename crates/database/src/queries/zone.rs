use model::{
    zone::{ZoneId, ZoneRecord},
    Snapshot,
};
use parking::database::Result;
use sqlx::{Executor, Postgres};
use utility::let_also::LetAlso;

use crate::data_model::{
    to_models,
    zone::{ZoneRow, ZoneValues},
    DatabaseRow,
};

use super::convert_error;

pub async fn get_all<'c, E>(executor: E) -> Result<Snapshot>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, ZoneRow>(
        "
        SELECT id, parking_name, parking_number, empty_spots, occupied_spots,
            total_spots, price_per_hour, schedule, has_surveillance,
            has_disabled_access, has_ev_charging, zone_type, coordinates, updated_at
        FROM parking_spots
        ORDER BY parking_number ASC;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|zones: Vec<ZoneRow>| to_models(zones))
}

pub async fn get<'c, E>(executor: E, id: ZoneId) -> Result<ZoneRecord>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, ZoneRow>(
        "
        SELECT id, parking_name, parking_number, empty_spots, occupied_spots,
            total_spots, price_per_hour, schedule, has_surveillance,
            has_disabled_access, has_ev_charging, zone_type, coordinates, updated_at
        FROM parking_spots
        WHERE id = $1;
        ",
    )
    .bind(id.0)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|zone: ZoneRow| zone.to_model())
}

pub async fn get_by_name<'c, E>(executor: E, name: &str) -> Result<ZoneRecord>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, ZoneRow>(
        "
        SELECT id, parking_name, parking_number, empty_spots, occupied_spots,
            total_spots, price_per_hour, schedule, has_surveillance,
            has_disabled_access, has_ev_charging, zone_type, coordinates, updated_at
        FROM parking_spots
        WHERE lower(parking_name) = lower($1);
        ",
    )
    .bind(name)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|zone: ZoneRow| zone.to_model())
}

pub async fn get_by_number<'c, E>(executor: E, parking_number: i32) -> Result<ZoneRecord>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, ZoneRow>(
        "
        SELECT id, parking_name, parking_number, empty_spots, occupied_spots,
            total_spots, price_per_hour, schedule, has_surveillance,
            has_disabled_access, has_ev_charging, zone_type, coordinates, updated_at
        FROM parking_spots
        WHERE parking_number = $1;
        ",
    )
    .bind(parking_number)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|zone: ZoneRow| zone.to_model())
}

pub async fn next_parking_number<'c, E>(executor: E) -> Result<i32>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar(
        "
        SELECT COALESCE(MAX(parking_number), 0) + 1
        FROM parking_spots;
        ",
    )
    .fetch_one(executor)
    .await
    .map_err(convert_error)
}

pub async fn insert<'c, E>(executor: E, zone: ZoneValues) -> Result<ZoneRecord>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, ZoneRow>(
        "
        INSERT INTO parking_spots(
            parking_name,
            parking_number,
            empty_spots,
            occupied_spots,
            total_spots,
            price_per_hour,
            schedule,
            has_surveillance,
            has_disabled_access,
            has_ev_charging,
            zone_type,
            coordinates
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id, parking_name, parking_number, empty_spots, occupied_spots,
            total_spots, price_per_hour, schedule, has_surveillance,
            has_disabled_access, has_ev_charging, zone_type, coordinates, updated_at;
        ",
    )
    .bind(zone.parking_name)
    .bind(zone.parking_number)
    .bind(zone.empty_spots)
    .bind(zone.occupied_spots)
    .bind(zone.total_spots)
    .bind(zone.price_per_hour)
    .bind(zone.schedule)
    .bind(zone.has_surveillance)
    .bind(zone.has_disabled_access)
    .bind(zone.has_ev_charging)
    .bind(zone.zone_type)
    .bind(zone.coordinates)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|zone: ZoneRow| zone.to_model())
}

pub async fn update<'c, E>(executor: E, id: ZoneId, zone: ZoneValues) -> Result<ZoneRecord>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, ZoneRow>(
        "
        UPDATE parking_spots
        SET
            parking_name = $2,
            parking_number = $3,
            empty_spots = $4,
            occupied_spots = $5,
            total_spots = $6,
            price_per_hour = $7,
            schedule = $8,
            has_surveillance = $9,
            has_disabled_access = $10,
            has_ev_charging = $11,
            zone_type = $12,
            coordinates = $13,
            updated_at = now()
        WHERE id = $1
        RETURNING id, parking_name, parking_number, empty_spots, occupied_spots,
            total_spots, price_per_hour, schedule, has_surveillance,
            has_disabled_access, has_ev_charging, zone_type, coordinates, updated_at;
        ",
    )
    .bind(id.0)
    .bind(zone.parking_name)
    .bind(zone.parking_number)
    .bind(zone.empty_spots)
    .bind(zone.occupied_spots)
    .bind(zone.total_spots)
    .bind(zone.price_per_hour)
    .bind(zone.schedule)
    .bind(zone.has_surveillance)
    .bind(zone.has_disabled_access)
    .bind(zone.has_ev_charging)
    .bind(zone.zone_type)
    .bind(zone.coordinates)
    .fetch_one(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|zone: ZoneRow| zone.to_model())
}
