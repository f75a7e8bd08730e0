//! The viewer's model of the world. Every snapshot replaces the zone list
//! wholesale and everything visible is derived from that list alone, so the
//! same snapshot always yields the same view.

use model::{
    occupancy::{Occupancy, ZoneColor},
    stats::SnapshotStats,
    zone::{Coordinate, ZoneRecord, ZoneType},
    Snapshot,
};

/// One zone as drawn on the map and in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneView {
    pub name: String,
    pub number: i32,
    pub occupancy: Occupancy,
    pub color: ZoneColor,
    pub zone_type: ZoneType,
    pub empty_spots: u32,
    pub total_spots: u32,
    pub free_percentage: u32,
    pub shape: Vec<Coordinate>,
}

impl From<&ZoneRecord> for ZoneView {
    fn from(record: &ZoneRecord) -> Self {
        let zone = &record.zone;
        let occupancy = zone.occupancy();
        let mut shape = zone.coordinates.clone();
        shape.sort_by_key(|point| point.point_order);
        ZoneView {
            name: zone.parking_name.clone(),
            number: zone.parking_number,
            occupancy,
            color: occupancy.color(),
            zone_type: zone.zone_type,
            empty_spots: zone.empty_spots,
            total_spots: zone.effective_total(),
            free_percentage: zone.free_percentage(),
            shape,
        }
    }
}

/// Details of the selected zone.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPanel {
    pub name: String,
    pub number: i32,
    pub badge: String,
    pub color: ZoneColor,
    pub type_name: &'static str,
    pub type_color: &'static str,
    pub spots_text: String,
    pub price_text: String,
    pub schedule: String,
    pub facilities: Vec<&'static str>,
    pub directions: Option<String>,
    /// The zone is missing from the latest snapshot, the panel shows the last
    /// data that was known for it.
    pub stale: bool,
}

impl From<&ZoneRecord> for DetailPanel {
    fn from(record: &ZoneRecord) -> Self {
        let zone = &record.zone;
        let facilities = [
            (zone.has_surveillance, "surveillance"),
            (zone.has_disabled_access, "disabled access"),
            (zone.has_ev_charging, "EV charging"),
        ]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect();
        DetailPanel {
            name: zone.parking_name.clone(),
            number: zone.parking_number,
            badge: zone.badge(),
            color: zone.occupancy().color(),
            type_name: zone.zone_type.display_name(),
            type_color: zone.zone_type.badge_color(),
            spots_text: format!("{} / {}", zone.empty_spots, zone.effective_total()),
            price_text: zone.price_text(),
            schedule: zone.schedule.clone(),
            facilities,
            directions: zone.directions_url(),
            stale: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    snapshot: Snapshot,
    zones: Vec<ZoneView>,
    stats: SnapshotStats,
    selected: Option<String>,
    panel: Option<DetailPanel>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the zone list and re-derives every visual. A selected zone
    /// that is no longer present keeps its last panel.
    pub fn reconcile(&mut self, snapshot: Snapshot) {
        self.zones = snapshot.iter().map(ZoneView::from).collect();
        self.stats = SnapshotStats::from_records(&snapshot);
        self.snapshot = snapshot;

        let Some(name) = self.selected.as_deref() else {
            return;
        };
        match self.record(name).map(DetailPanel::from) {
            Some(panel) => self.panel = Some(panel),
            None => {
                if let Some(panel) = self.panel.as_mut() {
                    panel.stale = true;
                }
            }
        }
    }

    /// Opens the detail panel of the named zone. Returns `false` when the
    /// current snapshot has no such zone.
    pub fn select(&mut self, name: &str) -> bool {
        let Some(panel) = self.record(name).map(DetailPanel::from) else {
            return false;
        };
        self.selected = Some(panel.name.clone());
        self.panel = Some(panel);
        true
    }

    pub fn close_panel(&mut self) {
        self.selected = None;
        self.panel = None;
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn zones(&self) -> &[ZoneView] {
        &self.zones
    }

    pub fn stats(&self) -> SnapshotStats {
        self.stats
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn panel(&self) -> Option<&DetailPanel> {
        self.panel.as_ref()
    }

    fn record(&self, name: &str) -> Option<&ZoneRecord> {
        self.snapshot
            .iter()
            .find(|record| record.zone.parking_name == name)
    }
}

#[cfg(test)]
mod tests {
    use model::{zone::ZoneId, ExampleData as _};

    use super::*;

    fn record(id: i32, name: &str, empty: u32, total: u32) -> ZoneRecord {
        let mut record = ZoneRecord::example_data();
        record.id = ZoneId(id);
        record.zone.parking_name = name.to_owned();
        record.zone.parking_number = id;
        record.zone.empty_spots = empty;
        record.zone.occupied_spots = total - empty;
        record.zone.total_spots = total;
        record
    }

    #[test]
    fn later_snapshot_replaces_earlier() {
        let mut view = ViewState::new();
        view.reconcile(vec![record(1, "A", 5, 10), record(2, "B", 0, 10)]);
        let second = vec![record(3, "C", 3, 10)];
        view.reconcile(second.clone());

        assert_eq!(view.snapshot(), &second);
        assert_eq!(view.zones().len(), 1);
        assert_eq!(view.zones()[0].name, "C");
        assert_eq!(view.zones()[0].occupancy, Occupancy::Limited);
        assert_eq!(view.stats().total_zones, 1);
        assert_eq!(view.stats().total_empty, 3);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let snapshot = vec![record(1, "A", 5, 10), record(2, "B", 0, 10)];
        let mut view = ViewState::new();
        view.reconcile(snapshot.clone());
        view.select("B");
        let once = view.clone();
        view.reconcile(snapshot);
        assert_eq!(view, once);
    }

    #[test]
    fn selection_survives_replacement() {
        let mut view = ViewState::new();
        view.reconcile(vec![record(1, "A", 5, 10)]);
        assert!(view.select("A"));
        assert_eq!(view.panel().unwrap().badge, "LIMITED (50%)");

        view.reconcile(vec![record(7, "A", 9, 10)]);
        let panel = view.panel().unwrap();
        assert_eq!(panel.number, 7);
        assert_eq!(panel.badge, "AVAILABLE (90%)");
        assert_eq!(panel.spots_text, "9 / 10");
        assert!(!panel.stale);
    }

    #[test]
    fn vanished_zone_keeps_stale_panel() {
        let mut view = ViewState::new();
        view.reconcile(vec![record(1, "A", 0, 10)]);
        view.select("A");
        view.reconcile(vec![record(2, "B", 4, 10)]);

        assert_eq!(view.selected(), Some("A"));
        let panel = view.panel().unwrap();
        assert!(panel.stale);
        assert_eq!(panel.badge, "FULL");

        // the zone comes back
        view.reconcile(vec![record(1, "A", 2, 10)]);
        assert!(!view.panel().unwrap().stale);
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let mut view = ViewState::new();
        view.reconcile(vec![record(1, "A", 0, 10)]);
        assert!(!view.select("Z"));
        assert!(view.panel().is_none());

        view.select("A");
        view.close_panel();
        assert!(view.selected().is_none());
        assert!(view.panel().is_none());
    }

    #[test]
    fn panel_lists_facilities_and_directions() {
        let mut view = ViewState::new();
        let mut zone = record(1, "A", 3, 10);
        zone.zone.has_surveillance = true;
        zone.zone.has_disabled_access = false;
        zone.zone.has_ev_charging = true;
        view.reconcile(vec![zone]);
        view.select("A");

        let panel = view.panel().unwrap();
        assert_eq!(panel.facilities, vec!["surveillance", "EV charging"]);
        assert_eq!(panel.badge, "LIMITED (30%)");
        assert_eq!(panel.price_text, "3.5 / hour");
        assert!(panel.directions.as_deref().unwrap().starts_with("https://www.google.com/maps"));
    }
}
