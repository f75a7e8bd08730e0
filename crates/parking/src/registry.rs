use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};
use tokio::sync::mpsc::{self, error::TrySendError};

pub type SubscriberId = u64;

/// Serialized messages waiting to be written to one subscriber's socket.
pub type Outbox = mpsc::Receiver<Arc<str>>;

/// Live viewer sessions. Owned by exactly one task, so adding, removing and
/// broadcasting never interleave.
#[derive(Debug)]
pub struct SubscriberRegistry {
    subscribers: IndexMap<SubscriberId, mpsc::Sender<Arc<str>>>,
    last_id: SubscriberId,
    buffer: usize,
}

impl SubscriberRegistry {
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: IndexMap::new(),
            last_id: 0,
            buffer: buffer.max(1),
        }
    }

    /// Registers a subscriber. If a snapshot is already known, it is the
    /// first message in the new outbox.
    pub fn add(&mut self, current: Option<Arc<str>>) -> (SubscriberId, Outbox) {
        let (sender, outbox) = mpsc::channel(self.buffer);
        if let Some(snapshot) = current {
            // cannot fail, the channel is fresh and has room for one
            let _ = sender.try_send(snapshot);
        }
        self.last_id += 1;
        self.subscribers.insert(self.last_id, sender);
        debug!("subscriber {} registered, {} live", self.last_id, self.len());
        (self.last_id, outbox)
    }

    pub fn remove(&mut self, id: SubscriberId) -> bool {
        let removed = self.subscribers.shift_remove(&id).is_some();
        if removed {
            debug!("subscriber {} removed, {} live", id, self.len());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Hands `payload` to every subscriber without waiting on any of them.
    /// Subscribers whose session has ended are dropped. A subscriber that is
    /// still busy with earlier snapshots skips this one. Returns the number
    /// of subscribers the payload was queued for.
    pub fn broadcast(&mut self, payload: &Arc<str>) -> usize {
        let mut delivered = 0;
        self.subscribers
            .retain(|id, sender| match sender.try_send(Arc::clone(payload)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!("subscriber {} is lagging behind, skipping snapshot", id);
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("subscriber {} is gone, removing", id);
                    false
                }
            });
        delivered
    }
}
