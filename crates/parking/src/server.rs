use std::time::Duration;

use log::warn;
use tokio_util::sync::CancellationToken;

use crate::{
    broadcaster::{self, BroadcasterConfig, BroadcasterHandle},
    client::Client,
    collector::{self, CollectorRef, SnapshotCollector},
    database::Database,
};

#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub refresh_interval: Duration,
    pub broadcaster: BroadcasterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(5),
            broadcaster: BroadcasterConfig::default(),
        }
    }
}

/// Owns the broadcaster and its periodic refresh. Dropping every client and
/// calling [`Server::shutdown`] stops both.
pub struct Server<D>
where
    D: Database + Send + Sync + Sized + 'static,
{
    database: D,
    broadcaster: BroadcasterHandle,
    refresh: CollectorRef,
}

impl<D> Server<D>
where
    D: Database + 'static,
{
    /// Loads the initial snapshot and starts the periodic refresh. An
    /// unreachable store is not fatal, the refresh keeps retrying.
    pub async fn start(database: D, config: ServerConfig) -> Self {
        let broadcaster = broadcaster::spawn(config.broadcaster);
        if let Err(why) = broadcaster.refresh(&database).await {
            warn!("initial snapshot could not be loaded: {}", why);
        }

        let handle = broadcaster.clone();
        let store = database.clone();
        let interval = config.refresh_interval;
        let refresh = collector::run(
            move || SnapshotCollector::new(store.clone(), handle.clone(), interval),
            CancellationToken::new(),
        );

        Self {
            database,
            broadcaster,
            refresh,
        }
    }

    pub fn client(&self) -> Client<D> {
        Client::new(self.database.clone(), self.broadcaster.clone())
    }

    pub fn broadcaster(&self) -> BroadcasterHandle {
        self.broadcaster.clone()
    }

    /// Stops the periodic refresh. No tick fires after this returns.
    pub async fn shutdown(self) {
        self.refresh.stop().await;
    }
}
