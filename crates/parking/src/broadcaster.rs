use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::{debug, error, info, warn};
use model::Snapshot;
use tokio::sync::{mpsc, oneshot};

use crate::{
    database::{Database, ZoneRepo},
    registry::{Outbox, SubscriberId, SubscriberRegistry},
    RequestError, RequestResult,
};

#[derive(Debug, Clone, Copy)]
pub struct BroadcasterConfig {
    /// Snapshots queued per subscriber before further ones are skipped.
    pub subscriber_buffer: usize,
    pub command_buffer: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: 8,
            command_buffer: 64,
        }
    }
}

pub struct Subscription {
    pub id: SubscriberId,
    pub outbox: Outbox,
}

pub enum Command {
    Subscribe {
        responder: oneshot::Sender<Subscription>,
    },
    Unsubscribe {
        id: SubscriberId,
    },
    /// Replace the snapshot and push it to every subscriber. Reads that
    /// started before the one behind the current snapshot are dropped.
    Publish {
        read: u64,
        snapshot: Arc<Snapshot>,
        payload: Arc<str>,
        responder: oneshot::Sender<usize>,
    },
    Current {
        responder: oneshot::Sender<Option<Arc<Snapshot>>>,
    },
    SubscriberCount {
        responder: oneshot::Sender<usize>,
    },
}

/// Holds the authoritative snapshot and the subscriber registry. Both are
/// only touched from the broadcaster's own task, which never waits on the
/// store.
struct Broadcaster {
    registry: SubscriberRegistry,
    read: u64,
    snapshot: Option<Arc<Snapshot>>,
    payload: Option<Arc<str>>,
}

impl Broadcaster {
    fn handle(&mut self, command: Command) {
        match command {
            Command::Subscribe { responder } => {
                let (id, outbox) = self.registry.add(self.payload.clone());
                if responder.send(Subscription { id, outbox }).is_err() {
                    self.registry.remove(id);
                }
            }
            Command::Unsubscribe { id } => {
                self.registry.remove(id);
            }
            Command::Publish {
                read,
                snapshot,
                payload,
                responder,
            } => {
                let _ = responder.send(self.publish(read, snapshot, payload));
            }
            Command::Current { responder } => {
                let _ = responder.send(self.snapshot.clone());
            }
            Command::SubscriberCount { responder } => {
                let _ = responder.send(self.registry.len());
            }
        }
    }

    fn publish(&mut self, read: u64, snapshot: Arc<Snapshot>, payload: Arc<str>) -> usize {
        if read <= self.read {
            debug!("dropping snapshot from read {}, already at {}", read, self.read);
            return 0;
        }
        self.read = read;
        self.snapshot = Some(snapshot);
        self.payload = Some(Arc::clone(&payload));
        let delivered = self.registry.broadcast(&payload);
        debug!(
            "snapshot pushed to {} of {} subscribers",
            delivered,
            self.registry.len()
        );
        delivered
    }
}

/// Cheap to clone. The broadcaster stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct BroadcasterHandle {
    sender: mpsc::Sender<Command>,
    reads: Arc<AtomicU64>,
}

pub fn spawn(config: BroadcasterConfig) -> BroadcasterHandle {
    let (sender, mut receiver) = mpsc::channel(config.command_buffer.max(1));
    let mut broadcaster = Broadcaster {
        registry: SubscriberRegistry::new(config.subscriber_buffer),
        read: 0,
        snapshot: None,
        payload: None,
    };

    tokio::spawn(async move {
        while let Some(command) = receiver.recv().await {
            // a panicking command must not take the registry down with it
            let result = panic::catch_unwind(AssertUnwindSafe(|| broadcaster.handle(command)));
            if let Err(why) = result {
                error!("broadcaster panicked while handling a command: {:?}", why);
            }
        }
        info!("broadcaster stopped");
    });

    BroadcasterHandle {
        sender,
        reads: Arc::new(AtomicU64::new(0)),
    }
}

impl BroadcasterHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> RequestResult<T> {
        let (responder, response) = oneshot::channel();
        self.sender.send(command(responder)).await?;
        Ok(response.await?)
    }

    /// Registers a new subscriber. Its outbox already holds the current
    /// snapshot, if there is one.
    pub async fn subscribe(&self) -> RequestResult<Subscription> {
        self.request(|responder| Command::Subscribe { responder }).await
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> RequestResult<()> {
        self.sender.send(Command::Unsubscribe { id }).await?;
        Ok(())
    }

    /// Reloads the snapshot from the store and pushes it to all subscribers.
    /// Returns the number of subscribers it was queued for. The store is read
    /// on the caller's task, so a slow store never holds up subscribers.
    /// On a store failure the previous snapshot stays in place and nothing
    /// is pushed.
    pub async fn refresh<D: Database>(&self, database: &D) -> RequestResult<usize> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = match database.auto().all_zones().await {
            Ok(snapshot) => snapshot,
            Err(why) => {
                warn!("snapshot refresh failed, keeping previous snapshot: {}", why);
                return Err(why.into());
            }
        };
        let payload: Arc<str> = serde_json::to_string(&snapshot)
            .map_err(RequestError::other)?
            .into();
        let snapshot = Arc::new(snapshot);

        self.request(|responder| Command::Publish {
            read,
            snapshot,
            payload,
            responder,
        })
        .await
    }

    /// The last snapshot read successfully, if any.
    pub async fn current(&self) -> RequestResult<Option<Arc<Snapshot>>> {
        self.request(|responder| Command::Current { responder }).await
    }

    pub async fn subscriber_count(&self) -> RequestResult<usize> {
        self.request(|responder| Command::SubscriberCount { responder }).await
    }
}
