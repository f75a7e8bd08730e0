pub use serde_with;

pub mod message;
pub mod occupancy;
pub mod stats;
pub mod zone;

pub trait ExampleData {
    fn example_data() -> Self;
}

/// The complete, ordered set of all zone records at one instant. Snapshots are
/// always total, consumers never receive deltas.
pub type Snapshot = Vec<zone::ZoneRecord>;

/// Orders a snapshot the way it is served: by display number, ascending.
pub fn sort_snapshot(snapshot: &mut Snapshot) {
    snapshot.sort_by_key(|record| record.zone.parking_number);
}
