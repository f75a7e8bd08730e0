use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::zone::{Price, Zone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    Full,
    FewSpots,
    Limited,
    Available,
}

impl Occupancy {
    /// `empty == 0` is always full. Otherwise more than half free is available
    /// and more than a fifth free is limited.
    pub fn classify(empty_spots: u32, total_spots: u32) -> Self {
        if empty_spots == 0 || total_spots == 0 {
            return Occupancy::Full;
        }
        // exact rational comparison: empty/total > 1/2, empty/total > 1/5
        let (empty, total) = (u64::from(empty_spots), u64::from(total_spots));
        if empty * 2 > total {
            Occupancy::Available
        } else if empty * 5 > total {
            Occupancy::Limited
        } else {
            Occupancy::FewSpots
        }
    }

    pub fn color(self) -> ZoneColor {
        match self {
            Occupancy::Full => ZoneColor::solid("#D32F2F"),
            Occupancy::Available => ZoneColor::solid("#388E3C"),
            Occupancy::Limited => ZoneColor::solid("#F57C00"),
            Occupancy::FewSpots => ZoneColor {
                stroke: "#c32311",
                fill: "#f0420d",
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Occupancy::Full => "FULL",
            Occupancy::FewSpots => "FEW SPOTS",
            Occupancy::Limited => "LIMITED",
            Occupancy::Available => "AVAILABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoneColor {
    pub stroke: &'static str,
    pub fill: &'static str,
}

impl ZoneColor {
    const fn solid(color: &'static str) -> Self {
        ZoneColor {
            stroke: color,
            fill: color,
        }
    }
}

impl Zone {
    /// Stored total, or `empty + occupied` for records that carry none.
    pub fn effective_total(&self) -> u32 {
        if self.total_spots > 0 {
            self.total_spots
        } else {
            self.empty_spots.saturating_add(self.occupied_spots)
        }
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy::classify(self.empty_spots, self.effective_total())
    }

    /// Share of free spots, rounded to a whole percent.
    pub fn free_percentage(&self) -> u32 {
        match self.effective_total() {
            0 => 0,
            total => {
                ((f64::from(self.empty_spots) / f64::from(total)) * 100.0).round() as u32
            }
        }
    }

    /// Badge text of the detail panel, e.g. `LIMITED (30%)`.
    pub fn badge(&self) -> String {
        match self.occupancy() {
            Occupancy::Full => Occupancy::Full.label().to_owned(),
            other => format!("{} ({}%)", other.label(), self.free_percentage()),
        }
    }

    pub fn price_text(&self) -> String {
        match self.price_per_hour {
            Price::Known(price) => format!("{} / hour", price),
            Price::Unknown => "? / hour".to_owned(),
        }
    }

    /// Directions target the first point of the zone's shape.
    pub fn directions_url(&self) -> Option<String> {
        self.coordinates.first().map(|point| {
            format!(
                "https://www.google.com/maps/dir/?api=1&destination={},{}",
                point.latitude, point.longitude
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{zone::ZoneRecord, ExampleData as _};

    use super::*;

    fn zone(empty: u32, occupied: u32, total: u32) -> Zone {
        let mut zone = ZoneRecord::example_data().zone;
        zone.empty_spots = empty;
        zone.occupied_spots = occupied;
        zone.total_spots = total;
        zone
    }

    #[test]
    fn thirty_percent_is_limited() {
        let zone = zone(3, 7, 10);
        assert_eq!(zone.free_percentage(), 30);
        assert_eq!(zone.occupancy(), Occupancy::Limited);
        assert_eq!(zone.badge(), "LIMITED (30%)");
    }

    #[test]
    fn no_empty_spots_is_always_full() {
        for total in [0, 1, 10, 10_000] {
            assert_eq!(zone(0, total, total).occupancy(), Occupancy::Full);
        }
        assert_eq!(zone(0, 5, 5).badge(), "FULL");
    }

    #[test]
    fn more_than_half_is_available() {
        assert_eq!(Occupancy::classify(51, 100), Occupancy::Available);
        assert_eq!(Occupancy::classify(50, 100), Occupancy::Limited);
        assert_eq!(Occupancy::classify(1, 1), Occupancy::Available);
    }

    #[test]
    fn at_most_a_fifth_is_few_spots() {
        assert_eq!(Occupancy::classify(2, 10), Occupancy::FewSpots);
        assert_eq!(Occupancy::classify(21, 100), Occupancy::Limited);
        assert_eq!(Occupancy::classify(2, 10).color().fill, "#f0420d");
    }

    #[test]
    fn total_is_derived_when_missing() {
        let zone = zone(4, 4, 0);
        assert_eq!(zone.effective_total(), 8);
        assert_eq!(zone.occupancy(), Occupancy::Limited);
        assert_eq!(zone.free_percentage(), 50);
    }

    #[test]
    fn price_and_directions() {
        let mut zone = zone(3, 7, 10);
        assert_eq!(zone.price_text(), "3.5 / hour");
        zone.price_per_hour = Price::Unknown;
        assert_eq!(zone.price_text(), "? / hour");
        let url = zone.directions_url().unwrap();
        assert!(url.ends_with("destination=45.7538,21.2251"));
    }
}
