use std::{error, fmt};

use chrono::{DateTime, TimeZone as _, Utc};
use itertools::Itertools as _;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_repr::{Deserialize_repr, Serialize_repr};
use utility::serde::{default_true, trimmed};

use crate::ExampleData;

pub const DEFAULT_SCHEDULE: &str = "24/7";

/// Surrogate key assigned by the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ZoneId(pub i32);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum ZoneType {
    #[default]
    Area = 0,
    CurbLine = 1,
    Multilevel = 2,
    Underground = 3,
}

impl ZoneType {
    /// A curb line is a polyline, everything else is drawn as a polygon.
    pub fn is_line(self) -> bool {
        matches!(self, ZoneType::CurbLine)
    }

    pub fn minimum_points(self) -> usize {
        if self.is_line() {
            2
        } else {
            3
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ZoneType::Area => "area",
            ZoneType::CurbLine => "curb-line",
            ZoneType::Multilevel => "multilevel",
            ZoneType::Underground => "underground",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ZoneType::Area => "Parking area",
            ZoneType::CurbLine => "Street parking",
            ZoneType::Multilevel => "Multilevel",
            ZoneType::Underground => "Underground",
        }
    }

    pub fn badge_color(self) -> &'static str {
        match self {
            ZoneType::Area => "#4CAF50",
            ZoneType::CurbLine => "#2196F3",
            ZoneType::Multilevel => "#FF9800",
            ZoneType::Underground => "#9C27B0",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i16> for ZoneType {
    type Error = i16;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ZoneType::Area),
            1 => Ok(ZoneType::CurbLine),
            2 => Ok(ZoneType::Multilevel),
            3 => Ok(ZoneType::Underground),
            other => Err(other),
        }
    }
}

/// Hourly price. On the wire an unknown price is `null`; submissions may also
/// send a negative number or the string `"unknown"`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Price {
    Known(f64),
    #[default]
    Unknown,
}

impl Price {
    pub fn new(value: f64) -> Self {
        if value.is_finite() && value >= 0.0 {
            Price::Known(value)
        } else {
            Price::Unknown
        }
    }

    pub fn from_option(value: Option<f64>) -> Self {
        value.map(Price::new).unwrap_or(Price::Unknown)
    }

    pub fn as_option(self) -> Option<f64> {
        match self {
            Price::Known(value) => Some(value),
            Price::Unknown => None,
        }
    }

    /// For `Option<Price>` fields of partial updates: present means "set".
    pub fn deserialize_some<'de, D>(deserializer: D) -> Result<Option<Price>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Price::deserialize(deserializer).map(Some)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Price::Known(value) => serializer.serialize_f64(*value),
            Price::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawPrice {
            Number(f64),
            Text(String),
        }

        Ok(match Option::<RawPrice>::deserialize(deserializer)? {
            Some(RawPrice::Number(value)) => Price::new(value),
            Some(RawPrice::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map(Price::new)
                .unwrap_or(Price::Unknown),
            None => Price::Unknown,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub point_order: u32,
}

/// Everything about a zone except the fields the store assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Zone {
    pub parking_name: String,
    pub parking_number: i32,
    pub empty_spots: u32,
    pub occupied_spots: u32,
    pub total_spots: u32,
    #[schemars(with = "Option<f64>")]
    pub price_per_hour: Price,
    pub schedule: String,
    pub has_surveillance: bool,
    pub has_disabled_access: bool,
    pub has_ev_charging: bool,
    #[serde(rename = "type")]
    #[schemars(with = "u8")]
    pub zone_type: ZoneType,
    pub coordinates: Vec<Coordinate>,
}

impl Zone {
    /// Applies a detector count of free spots. Occupied spots follow from the
    /// zone's capacity.
    pub fn apply_free_spots(&mut self, free_spots: u32) -> Result<(), ValidationError> {
        let total = self.effective_total();
        if free_spots > total {
            return Err(ValidationError::ExceedsCapacity {
                field: "free_spots",
                value: free_spots,
                total,
            });
        }
        self.total_spots = total;
        self.empty_spots = free_spots;
        self.occupied_spots = total - free_spots;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ZoneRecord {
    pub id: ZoneId,
    #[serde(flatten)]
    pub zone: Zone,
    pub updated_at: DateTime<Utc>,
}

impl ExampleData for ZoneRecord {
    fn example_data() -> Self {
        ZoneRecord {
            id: ZoneId(1),
            zone: Zone {
                parking_name: "Piata_Victoriei".to_owned(),
                parking_number: 1,
                empty_spots: 12,
                occupied_spots: 28,
                total_spots: 40,
                price_per_hour: Price::Known(3.5),
                schedule: "08:00-20:00".to_owned(),
                has_surveillance: true,
                has_disabled_access: true,
                has_ev_charging: false,
                zone_type: ZoneType::Area,
                coordinates: vec![
                    Coordinate {
                        latitude: 45.753_8,
                        longitude: 21.225_1,
                        point_order: 1,
                    },
                    Coordinate {
                        latitude: 45.754_1,
                        longitude: 21.226_0,
                        point_order: 2,
                    },
                    Coordinate {
                        latitude: 45.753_5,
                        longitude: 21.226_3,
                        point_order: 3,
                    },
                ],
            },
            updated_at: Utc
                .with_ymd_and_hms(2025, 11, 8, 12, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }
}

// - submissions -

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CoordinateInput {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub point_order: Option<u32>,
}

/// Body of an admin zone submission: a zone record without the fields the
/// store assigns. Capacity fields may be partial and are completed on
/// validation.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NewZone {
    #[serde(deserialize_with = "trimmed::deserialize")]
    pub parking_name: String,
    #[serde(default)]
    pub parking_number: Option<i32>,
    #[serde(default)]
    pub total_spots: Option<u32>,
    #[serde(default)]
    pub empty_spots: Option<u32>,
    #[serde(default)]
    pub occupied_spots: Option<u32>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub price_per_hour: Price,
    #[serde(deserialize_with = "trimmed::deserialize_option", default)]
    pub schedule: Option<String>,
    #[serde(default = "default_true")]
    pub has_surveillance: bool,
    #[serde(default = "default_true")]
    pub has_disabled_access: bool,
    #[serde(default = "default_true")]
    pub has_ev_charging: bool,
    #[serde(rename = "type", default)]
    #[schemars(with = "u8")]
    pub zone_type: ZoneType,
    pub coordinates: Vec<CoordinateInput>,
}

impl NewZone {
    /// Validates the submission and completes it into a `Zone` carrying the
    /// given display number.
    pub fn into_zone(self, parking_number: i32) -> Result<Zone, ValidationError> {
        if self.parking_name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if parking_number <= 0 {
            return Err(ValidationError::InvalidParkingNumber(parking_number));
        }
        let coordinates = normalize_points(self.zone_type, self.coordinates)?;
        let (total_spots, empty_spots, occupied_spots) =
            resolve_capacity(self.total_spots, self.empty_spots, self.occupied_spots)?;

        Ok(Zone {
            parking_name: self.parking_name,
            parking_number,
            empty_spots,
            occupied_spots,
            total_spots,
            price_per_hour: self.price_per_hour,
            schedule: self
                .schedule
                .unwrap_or_else(|| DEFAULT_SCHEDULE.to_owned()),
            has_surveillance: self.has_surveillance,
            has_disabled_access: self.has_disabled_access,
            has_ev_charging: self.has_ev_charging,
            zone_type: self.zone_type,
            coordinates,
        })
    }
}

/// Partial capacity/attribute update. Identity and shape are immutable.
/// Absent fields stay unchanged; `"price_per_hour": null` marks the price
/// unknown.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ZoneUpdate {
    #[serde(default)]
    pub empty_spots: Option<u32>,
    #[serde(default)]
    pub occupied_spots: Option<u32>,
    #[serde(default)]
    pub total_spots: Option<u32>,
    #[serde(default, deserialize_with = "Price::deserialize_some")]
    #[schemars(with = "Option<f64>")]
    pub price_per_hour: Option<Price>,
    #[serde(deserialize_with = "trimmed::deserialize_option", default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub has_surveillance: Option<bool>,
    #[serde(default)]
    pub has_disabled_access: Option<bool>,
    #[serde(default)]
    pub has_ev_charging: Option<bool>,
}

impl ZoneUpdate {
    pub fn apply(self, zone: &mut Zone) -> Result<(), ValidationError> {
        let total = self.total_spots.unwrap_or_else(|| zone.effective_total());
        let (total, empty, occupied) = match (self.empty_spots, self.occupied_spots) {
            (Some(empty), Some(occupied)) => {
                let sum = checked_sum(empty, occupied)?;
                if self.total_spots.is_some() && sum != total {
                    return Err(ValidationError::CapacityMismatch {
                        total,
                        empty,
                        occupied,
                    });
                }
                (sum, empty, occupied)
            }
            (Some(empty), None) => (total, empty, remainder("empty_spots", empty, total)?),
            (None, Some(occupied)) => {
                (total, remainder("occupied_spots", occupied, total)?, occupied)
            }
            (None, None) => {
                let occupied = zone.occupied_spots;
                (total, remainder("occupied_spots", occupied, total)?, occupied)
            }
        };
        if total == 0 {
            return Err(ValidationError::NoCapacity);
        }

        zone.total_spots = total;
        zone.empty_spots = empty;
        zone.occupied_spots = occupied;
        if let Some(price) = self.price_per_hour {
            zone.price_per_hour = price;
        }
        if let Some(schedule) = self.schedule {
            zone.schedule = schedule;
        }
        if let Some(flag) = self.has_surveillance {
            zone.has_surveillance = flag;
        }
        if let Some(flag) = self.has_disabled_access {
            zone.has_disabled_access = flag;
        }
        if let Some(flag) = self.has_ev_charging {
            zone.has_ev_charging = flag;
        }
        Ok(())
    }
}

/// A free-spot count reported by a detector for one zone.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectionReport {
    pub parking_number: i32,
    pub free_spots: u32,
}

// - validation -

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyName,
    InvalidParkingNumber(i32),
    NoCapacity,
    CapacityOverflow,
    CapacityMismatch {
        total: u32,
        empty: u32,
        occupied: u32,
    },
    ExceedsCapacity {
        field: &'static str,
        value: u32,
        total: u32,
    },
    TooFewPoints {
        zone_type: ZoneType,
        minimum: usize,
        actual: usize,
    },
    CoordinateOutOfRange {
        index: usize,
    },
    DuplicatePointOrder(u32),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "parking_name must not be empty"),
            Self::InvalidParkingNumber(number) => {
                write!(f, "parking_number must be positive, got {}", number)
            }
            Self::NoCapacity => write!(f, "a zone needs at least one spot"),
            Self::CapacityOverflow => write!(f, "spot counts are too large"),
            Self::CapacityMismatch {
                total,
                empty,
                occupied,
            } => write!(
                f,
                "empty_spots ({}) + occupied_spots ({}) must equal total_spots ({})",
                empty, occupied, total
            ),
            Self::ExceedsCapacity {
                field,
                value,
                total,
            } => write!(f, "{} ({}) exceeds total_spots ({})", field, value, total),
            Self::TooFewPoints {
                zone_type,
                minimum,
                actual,
            } => write!(
                f,
                "a {} zone needs at least {} points, got {}",
                zone_type, minimum, actual
            ),
            Self::CoordinateOutOfRange { index } => {
                write!(f, "coordinate #{} is outside the valid range", index + 1)
            }
            Self::DuplicatePointOrder(order) => {
                write!(f, "point_order {} is used more than once", order)
            }
        }
    }
}

impl error::Error for ValidationError {}

fn checked_sum(empty: u32, occupied: u32) -> Result<u32, ValidationError> {
    empty
        .checked_add(occupied)
        .ok_or(ValidationError::CapacityOverflow)
}

fn remainder(field: &'static str, value: u32, total: u32) -> Result<u32, ValidationError> {
    total
        .checked_sub(value)
        .ok_or(ValidationError::ExceedsCapacity { field, value, total })
}

/// Completes `(total, empty, occupied)`. A missing or zero total is derived
/// from the other two; a new zone without counts starts out empty.
fn resolve_capacity(
    total: Option<u32>,
    empty: Option<u32>,
    occupied: Option<u32>,
) -> Result<(u32, u32, u32), ValidationError> {
    let resolved = match (total.filter(|total| *total > 0), empty, occupied) {
        (Some(total), None, None) => (total, total, 0),
        (Some(total), Some(empty), None) => {
            (total, empty, remainder("empty_spots", empty, total)?)
        }
        (Some(total), None, Some(occupied)) => {
            (total, remainder("occupied_spots", occupied, total)?, occupied)
        }
        (Some(total), Some(empty), Some(occupied)) => {
            if checked_sum(empty, occupied)? != total {
                return Err(ValidationError::CapacityMismatch {
                    total,
                    empty,
                    occupied,
                });
            }
            (total, empty, occupied)
        }
        (None, empty, occupied) => {
            let (empty, occupied) = (empty.unwrap_or(0), occupied.unwrap_or(0));
            (checked_sum(empty, occupied)?, empty, occupied)
        }
    };
    if resolved.0 == 0 {
        return Err(ValidationError::NoCapacity);
    }
    Ok(resolved)
}

/// Checks the shape of a zone and fixes its point order. Explicit
/// `point_order`s are honoured when every point has one, otherwise the
/// submission order is used.
fn normalize_points(
    zone_type: ZoneType,
    points: Vec<CoordinateInput>,
) -> Result<Vec<Coordinate>, ValidationError> {
    let minimum = zone_type.minimum_points();
    if points.len() < minimum {
        return Err(ValidationError::TooFewPoints {
            zone_type,
            minimum,
            actual: points.len(),
        });
    }
    if let Some(index) = points.iter().position(|point| {
        !(point.latitude.is_finite()
            && point.longitude.is_finite()
            && (-90.0..=90.0).contains(&point.latitude)
            && (-180.0..=180.0).contains(&point.longitude))
    }) {
        return Err(ValidationError::CoordinateOutOfRange { index });
    }

    if points.iter().all(|point| point.point_order.is_some()) {
        if let Some(duplicate) = points
            .iter()
            .filter_map(|point| point.point_order)
            .duplicates()
            .next()
        {
            return Err(ValidationError::DuplicatePointOrder(duplicate));
        }
        Ok(points
            .into_iter()
            .filter_map(|point| {
                point.point_order.map(|point_order| Coordinate {
                    latitude: point.latitude,
                    longitude: point.longitude,
                    point_order,
                })
            })
            .sorted_by_key(|point| point.point_order)
            .collect())
    } else {
        Ok(points
            .into_iter()
            .zip(1..)
            .map(|(point, point_order)| Coordinate {
                latitude: point.latitude,
                longitude: point.longitude,
                point_order,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn submission(zone_type: u8, points: usize) -> NewZone {
        let coordinates = (0..points)
            .map(|i| json!({ "latitude": 45.75 + i as f64 * 0.001, "longitude": 21.22 }))
            .collect::<Vec<_>>();
        serde_json::from_value(json!({
            "parking_name": "Bulevardul_Revolutiei",
            "total_spots": 20,
            "type": zone_type,
            "coordinates": coordinates,
        }))
        .unwrap()
    }

    #[test]
    fn curb_line_accepts_two_points() {
        let zone = submission(1, 2).into_zone(7).unwrap();
        assert_eq!(zone.zone_type, ZoneType::CurbLine);
        assert_eq!(zone.coordinates.len(), 2);
        assert_eq!(
            zone.coordinates
                .iter()
                .map(|c| c.point_order)
                .collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn curb_line_rejects_one_point_naming_the_minimum() {
        let error = submission(1, 1).into_zone(7).unwrap_err();
        assert_eq!(
            error,
            ValidationError::TooFewPoints {
                zone_type: ZoneType::CurbLine,
                minimum: 2,
                actual: 1,
            }
        );
        assert!(error.to_string().contains("at least 2 points"));
    }

    #[test]
    fn areas_need_three_points() {
        assert!(matches!(
            submission(0, 2).into_zone(1),
            Err(ValidationError::TooFewPoints { minimum: 3, .. })
        ));
        assert!(submission(3, 3).into_zone(1).is_ok());
    }

    #[test]
    fn unknown_zone_type_is_rejected_on_parse() {
        let result = serde_json::from_value::<NewZone>(json!({
            "parking_name": "X",
            "type": 9,
            "coordinates": [],
        }));
        assert!(result.is_err());
    }

    #[test]
    fn new_zone_defaults() {
        let zone = submission(0, 3).into_zone(1).unwrap();
        assert_eq!(zone.total_spots, 20);
        assert_eq!(zone.empty_spots, 20);
        assert_eq!(zone.occupied_spots, 0);
        assert_eq!(zone.schedule, DEFAULT_SCHEDULE);
        assert_eq!(zone.price_per_hour, Price::Unknown);
        assert!(zone.has_surveillance && zone.has_disabled_access && zone.has_ev_charging);
    }

    #[test]
    fn total_is_derived_when_missing() {
        let new_zone: NewZone = serde_json::from_value(json!({
            "parking_name": "Iulius",
            "empty_spots": 4,
            "occupied_spots": 6,
            "coordinates": [
                { "latitude": 45.76, "longitude": 21.22 },
                { "latitude": 45.77, "longitude": 21.22 },
                { "latitude": 45.77, "longitude": 21.23 },
            ],
        }))
        .unwrap();
        let zone = new_zone.into_zone(2).unwrap();
        assert_eq!((zone.total_spots, zone.empty_spots, zone.occupied_spots), (10, 4, 6));
    }

    #[test]
    fn capacity_mismatch_is_rejected() {
        assert_eq!(
            resolve_capacity(Some(10), Some(4), Some(4)),
            Err(ValidationError::CapacityMismatch {
                total: 10,
                empty: 4,
                occupied: 4
            })
        );
        assert_eq!(resolve_capacity(None, None, None), Err(ValidationError::NoCapacity));
    }

    #[test]
    fn explicit_point_order_is_honoured() {
        let new_zone: NewZone = serde_json::from_value(json!({
            "parking_name": "Bastion",
            "total_spots": 5,
            "type": 1,
            "coordinates": [
                { "latitude": 45.2, "longitude": 21.0, "point_order": 2 },
                { "latitude": 45.1, "longitude": 21.0, "point_order": 1 },
            ],
        }))
        .unwrap();
        let zone = new_zone.into_zone(3).unwrap();
        assert_eq!(zone.coordinates[0].latitude, 45.1);
        assert_eq!(zone.coordinates[1].latitude, 45.2);
    }

    #[test]
    fn duplicate_point_order_is_rejected() {
        let new_zone: NewZone = serde_json::from_value(json!({
            "parking_name": "Bastion",
            "total_spots": 5,
            "type": 1,
            "coordinates": [
                { "latitude": 45.2, "longitude": 21.0, "point_order": 1 },
                { "latitude": 45.1, "longitude": 21.0, "point_order": 1 },
            ],
        }))
        .unwrap();
        assert_eq!(
            new_zone.into_zone(3),
            Err(ValidationError::DuplicatePointOrder(1))
        );
    }

    #[test]
    fn out_of_range_coordinate_is_rejected() {
        let mut new_zone = submission(1, 2);
        new_zone.coordinates[1].latitude = 123.0;
        assert_eq!(
            new_zone.into_zone(1),
            Err(ValidationError::CoordinateOutOfRange { index: 1 })
        );
    }

    #[test]
    fn price_accepts_unknown_spellings() {
        let parse = |value: serde_json::Value| serde_json::from_value::<Price>(value).unwrap();
        assert_eq!(parse(json!(2.5)), Price::Known(2.5));
        assert_eq!(parse(json!(0)), Price::Known(0.0));
        assert_eq!(parse(json!(-1)), Price::Unknown);
        assert_eq!(parse(json!(null)), Price::Unknown);
        assert_eq!(parse(json!("unknown")), Price::Unknown);
        assert_eq!(serde_json::to_value(Price::Unknown).unwrap(), json!(null));
    }

    #[test]
    fn update_recomputes_occupied_from_empty() {
        let mut zone = submission(0, 3).into_zone(1).unwrap();
        let update: ZoneUpdate =
            serde_json::from_value(json!({ "empty_spots": 5, "has_ev_charging": false }))
                .unwrap();
        update.apply(&mut zone).unwrap();
        assert_eq!((zone.total_spots, zone.empty_spots, zone.occupied_spots), (20, 5, 15));
        assert!(!zone.has_ev_charging);
        assert_eq!(zone.price_per_hour, Price::Unknown);
    }

    #[test]
    fn update_rejects_more_empty_than_total() {
        let mut zone = submission(0, 3).into_zone(1).unwrap();
        let before = zone.clone();
        let update = ZoneUpdate {
            empty_spots: Some(21),
            ..Default::default()
        };
        assert!(matches!(
            update.apply(&mut zone),
            Err(ValidationError::ExceedsCapacity { .. })
        ));
        assert_eq!(zone, before);
    }

    #[test]
    fn update_can_set_price_and_unknown_price() {
        let mut zone = submission(0, 3).into_zone(1).unwrap();
        let update: ZoneUpdate =
            serde_json::from_value(json!({ "price_per_hour": 4 })).unwrap();
        update.apply(&mut zone).unwrap();
        assert_eq!(zone.price_per_hour, Price::Known(4.0));

        let update: ZoneUpdate =
            serde_json::from_value(json!({ "price_per_hour": null })).unwrap();
        update.apply(&mut zone).unwrap();
        assert_eq!(zone.price_per_hour, Price::Unknown);
    }

    #[test]
    fn update_body_only_carries_changed_fields() {
        let update = ZoneUpdate {
            empty_spots: Some(2),
            price_per_hour: Some(Price::Unknown),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "empty_spots": 2, "price_per_hour": null })
        );
    }

    #[test]
    fn detection_sets_free_and_occupied() {
        let mut zone = submission(0, 3).into_zone(1).unwrap();
        zone.apply_free_spots(3).unwrap();
        assert_eq!((zone.empty_spots, zone.occupied_spots), (3, 17));
        assert!(zone.apply_free_spots(21).is_err());
    }

    #[test]
    fn record_wire_format_field_names() {
        let value = serde_json::to_value(ZoneRecord::example_data()).unwrap();
        for field in [
            "id",
            "parking_name",
            "parking_number",
            "empty_spots",
            "occupied_spots",
            "total_spots",
            "price_per_hour",
            "schedule",
            "has_surveillance",
            "has_disabled_access",
            "has_ev_charging",
            "type",
            "coordinates",
            "updated_at",
        ] {
            assert!(value.get(field).is_some(), "missing field `{}`", field);
        }
        assert_eq!(value["type"], json!(0));
        assert_eq!(value["coordinates"][0]["point_order"], json!(1));

        let parsed: ZoneRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, ZoneRecord::example_data());
    }
}
