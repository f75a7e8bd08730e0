use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{zone::ZoneRecord, ExampleData};

/// Totals over one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotStats {
    pub total_zones: u64,
    pub total_empty: u64,
    pub total_occupied: u64,
    pub total_spots: u64,
}

impl SnapshotStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ZoneRecord>) -> Self {
        records
            .into_iter()
            .fold(SnapshotStats::default(), |mut stats, record| {
                stats.total_zones += 1;
                stats.total_empty += u64::from(record.zone.empty_spots);
                stats.total_occupied += u64::from(record.zone.occupied_spots);
                stats.total_spots = stats.total_empty + stats.total_occupied;
                stats
            })
    }
}

impl ExampleData for SnapshotStats {
    fn example_data() -> Self {
        SnapshotStats::from_records(&[ZoneRecord::example_data()])
    }
}
