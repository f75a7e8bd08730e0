use log::{debug, warn};
use model::{
    stats::SnapshotStats,
    zone::{DetectionReport, NewZone, ZoneId, ZoneRecord, ZoneUpdate},
    Snapshot,
};
use utility::let_also::LetAlso;

use crate::{
    broadcaster::BroadcasterHandle,
    database::{Database, ZoneRepo},
    RequestError, RequestResult,
};

#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database + Send + Sync + Sized + 'static,
{
    pub database: D,
    broadcaster: BroadcasterHandle,
}

impl<D> Client<D>
where
    D: Database,
{
    pub(crate) fn new(database: D, broadcaster: BroadcasterHandle) -> Self {
        Self {
            database,
            broadcaster,
        }
    }

    pub fn broadcaster(&self) -> &BroadcasterHandle {
        &self.broadcaster
    }

    /// Reads the full snapshot from the store. If the store is down, the
    /// last snapshot the broadcaster holds is served instead.
    pub async fn get_snapshot(&self) -> RequestResult<Snapshot> {
        match self.database.auto().all_zones().await {
            Ok(snapshot) => Ok(snapshot),
            Err(why) => {
                let why = RequestError::from(why);
                match self.broadcaster.current().await {
                    Ok(Some(snapshot)) => {
                        warn!("store read failed, serving cached snapshot: {}", why);
                        Ok(snapshot.as_ref().clone())
                    }
                    _ => Err(why),
                }
            }
        }
    }

    pub async fn get_stats(&self) -> RequestResult<SnapshotStats> {
        self.get_snapshot()
            .await?
            .let_ref(|snapshot| SnapshotStats::from_records(snapshot))
            .let_owned(Ok)
    }

    pub async fn get_zone(&self, id: ZoneId) -> RequestResult<ZoneRecord> {
        Ok(self.database.auto().zone_by_id(id).await?)
    }

    pub async fn get_zone_by_name(&self, name: &str) -> RequestResult<ZoneRecord> {
        Ok(self.database.auto().zone_by_name(name.trim()).await?)
    }

    /// Validates and stores a new zone, then pushes the new snapshot.
    pub async fn create_zone(&self, new_zone: NewZone) -> RequestResult<ZoneRecord> {
        let mut repo = self.database.auto();
        let parking_number = match new_zone.parking_number {
            Some(number) => number,
            None => repo.next_parking_number().await?,
        };
        let zone = new_zone.into_zone(parking_number)?;
        let record = repo.insert_zone(zone).await?;
        debug!("zone {} `{}` created", record.id, record.zone.parking_name);
        self.publish().await;
        Ok(record)
    }

    /// Applies a partial update, then pushes the new snapshot. Nothing is
    /// written if the update does not validate.
    pub async fn update_zone(
        &self,
        id: ZoneId,
        update: ZoneUpdate,
    ) -> RequestResult<ZoneRecord> {
        let mut repo = self.database.auto();
        let mut zone = repo.zone_by_id(id).await?.zone;
        update.apply(&mut zone)?;
        let record = repo.update_zone(id, zone).await?;
        self.publish().await;
        Ok(record)
    }

    /// Stores a detector's free-spot count for the zone with the reported
    /// display number, then pushes the new snapshot.
    pub async fn report_detection(
        &self,
        report: DetectionReport,
    ) -> RequestResult<ZoneRecord> {
        let mut repo = self.database.auto();
        let current = repo.zone_by_number(report.parking_number).await?;
        let mut zone = current.zone;
        zone.apply_free_spots(report.free_spots)?;
        let record = repo.update_zone(current.id, zone).await?;
        self.publish().await;
        Ok(record)
    }

    /// The mutation already succeeded, a failed push only delays viewers
    /// until the next periodic refresh.
    async fn publish(&self) {
        if let Err(why) = self.broadcaster.refresh(&self.database).await {
            warn!("could not push snapshot after mutation: {}", why);
        }
    }
}
