use std::{any::Any, fmt::Debug, panic::AssertUnwindSafe, time::Duration};

use async_trait::async_trait;
use futures::FutureExt;
use log::{error, info, warn};
use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::{broadcaster::BroadcasterHandle, database::Database, RequestError};

#[derive(Debug, Clone)]
pub enum Continuation {
    Continue,
    Exit,
}

#[derive(Debug, Clone)]
pub enum SupervisionStrategy {
    Restart,
    Resume,
}

/// A periodic background job, supervised by [`run`].
#[async_trait]
pub trait Collector {
    type Error: Debug;

    /// Used in log messages.
    fn name(&self) -> &'static str;

    /// Called once per tick.
    async fn run(&mut self) -> Result<Continuation, Self::Error>;

    /// Specifies how long to wait between calls to the `run` method.
    fn tick(&self) -> Duration {
        Duration::from_secs(10)
    }

    /// Defines a backoff function, used to progressively increase the waiting
    /// time when consecutive failures happen.
    fn backoff(&self, last_backoff: Duration) -> Duration {
        last_backoff + self.tick()
    }

    /// Specifies the behavior if the collector returns an error.
    fn on_error(&self, _error: Self::Error) -> SupervisionStrategy {
        SupervisionStrategy::Resume
    }

    /// Specifies the behavior if the collector panics.
    fn on_panic(&self, _error: Box<dyn Any + Send>) -> SupervisionStrategy {
        SupervisionStrategy::Restart
    }
}

pub struct CollectorRef {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl CollectorRef {
    /// Stops the collector and waits until its loop has exited. No further
    /// run happens after this returns.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(why) = self.handle.await {
            error!("collector task ended abnormally: {:?}", why);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns a supervised collector loop. The first run happens immediately.
pub fn run<C, F>(factory: F, shutdown: CancellationToken) -> CollectorRef
where
    C: Collector + Send + 'static,
    <C as Collector>::Error: Send,
    F: 'static + Send + Fn() -> C,
{
    let token = shutdown.clone();
    let handle = tokio::spawn(async move {
        let mut collector = factory();
        let name = collector.name();
        let mut wait = Duration::ZERO;
        let mut backoff = collector.tick();
        info!("collector {} started", name);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = sleep(wait) => {}
            }

            let result = AssertUnwindSafe(collector.run()).catch_unwind().await;
            let strategy = match result {
                Ok(Ok(continuation)) => {
                    backoff = collector.tick();
                    match continuation {
                        Continuation::Continue => wait = collector.tick(),
                        Continuation::Exit => break,
                    }
                    continue;
                }
                Ok(Err(why)) => {
                    warn!("collector {} failed: {:?}", name, why);
                    collector.on_error(why)
                }
                Err(why) => {
                    error!("collector {} panicked: {:?}", name, why);
                    collector.on_panic(why)
                }
            };

            match strategy {
                SupervisionStrategy::Restart => collector = factory(),
                SupervisionStrategy::Resume => {}
            }
            backoff = collector.backoff(backoff);
            wait = backoff;
        }
        info!("collector {} stopped", name);
    });

    CollectorRef { shutdown, handle }
}

/// Re-reads the store on a fixed period and has the broadcaster push the
/// result. A failed refresh is simply retried on the next tick.
pub struct SnapshotCollector<D: Database> {
    database: D,
    broadcaster: BroadcasterHandle,
    interval: Duration,
}

impl<D: Database> SnapshotCollector<D> {
    pub fn new(database: D, broadcaster: BroadcasterHandle, interval: Duration) -> Self {
        Self {
            database,
            broadcaster,
            interval,
        }
    }
}

#[async_trait]
impl<D: Database + 'static> Collector for SnapshotCollector<D> {
    type Error = RequestError;

    fn name(&self) -> &'static str {
        "snapshot-refresh"
    }

    async fn run(&mut self) -> Result<Continuation, Self::Error> {
        match self.broadcaster.refresh(&self.database).await {
            Ok(_) => Ok(Continuation::Continue),
            Err(RequestError::BroadcasterGone) => Ok(Continuation::Exit),
            Err(why) => Err(why),
        }
    }

    fn tick(&self) -> Duration {
        self.interval
    }

    fn backoff(&self, _last_backoff: Duration) -> Duration {
        self.interval
    }
}
