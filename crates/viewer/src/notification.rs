use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: Instant,
}

/// Holds at most one notification. A new one replaces the current one and
/// each dismisses itself once its time is up.
#[derive(Debug)]
pub struct Notifications {
    current: Option<Notification>,
    last_id: u64,
    ttl: Duration,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: None,
            last_id: 0,
            ttl,
        }
    }

    pub fn show(&mut self, kind: NotificationKind, message: impl Into<String>) -> &Notification {
        self.last_id += 1;
        self.current.insert(Notification {
            id: self.last_id,
            kind,
            message: message.into(),
            expires_at: Instant::now() + self.ttl,
        })
    }

    /// Removes the current notification if it has expired. Returns whether it
    /// was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.current {
            Some(notification) if notification.expires_at <= now => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|notification| notification.expires_at)
    }
}
