use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification permission denied")]
    PermissionDenied,
    #[error("no scheduled notification with identifier {0}")]
    NotFound(String),
    #[error("notification backend failed: {0}")]
    Backend(String),
}

/// What a notification shows, plus the payload used to correlate it later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl NotificationContent {
    /// Entity id carried in the payload, if any
    pub fn entity_id(&self) -> Option<i64> {
        self.data.get("id").and_then(serde_json::Value::as_i64)
    }
}

/// A notification waiting to fire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub identifier: String,
    pub content: NotificationContent,
    /// `None` means "deliver immediately"
    pub trigger: Option<DateTime<Utc>>,
}

/// Platform local-notification subsystem.
///
/// Mobile adapters implement this over the OS notification APIs.
#[async_trait]
pub trait NotificationCenter: Send + Sync {
    /// Schedule a notification and return its identifier
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: Option<DateTime<Utc>>,
    ) -> Result<String, NotificationError>;

    /// Every notification still waiting to fire
    async fn scheduled(&self) -> Result<Vec<ScheduledNotification>, NotificationError>;

    async fn cancel(&self, identifier: &str) -> Result<(), NotificationError>;
}

/// Notification center that keeps everything in memory.
///
/// Immediate notifications are recorded as delivered right away; dated ones
/// stay pending until `take_due` hands them out.
#[derive(Debug)]
pub struct InMemoryNotificationCenter {
    pending: Mutex<Vec<ScheduledNotification>>,
    delivered: Mutex<Vec<ScheduledNotification>>,
    permitted: bool,
}

impl InMemoryNotificationCenter {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            delivered: Mutex::new(Vec::new()),
            permitted: true,
        }
    }

    /// Center that rejects every `schedule` call, as when the user refused
    /// notification permission.
    pub fn denied() -> Self {
        Self {
            permitted: false,
            ..Self::new()
        }
    }

    /// Remove and return pending notifications whose trigger has arrived,
    /// earliest first. They are also recorded as delivered.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<ScheduledNotification> {
        let mut pending = lock(&self.pending);
        let (mut due, rest): (Vec<_>, Vec<_>) = pending
            .drain(..)
            .partition(|n| n.trigger.map(|t| t <= now).unwrap_or(true));
        *pending = rest;
        due.sort_by_key(|n| n.trigger);

        lock(&self.delivered).extend(due.iter().cloned());
        due
    }

    pub fn delivered(&self) -> Vec<ScheduledNotification> {
        lock(&self.delivered).clone()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl Default for InMemoryNotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationCenter for InMemoryNotificationCenter {
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: Option<DateTime<Utc>>,
    ) -> Result<String, NotificationError> {
        if !self.permitted {
            return Err(NotificationError::PermissionDenied);
        }
        let notification = ScheduledNotification {
            identifier: uuid::Uuid::new_v4().to_string(),
            content,
            trigger,
        };
        let identifier = notification.identifier.clone();
        match trigger {
            Some(_) => lock(&self.pending).push(notification),
            None => lock(&self.delivered).push(notification),
        }
        Ok(identifier)
    }

    async fn scheduled(&self) -> Result<Vec<ScheduledNotification>, NotificationError> {
        Ok(lock(&self.pending).clone())
    }

    async fn cancel(&self, identifier: &str) -> Result<(), NotificationError> {
        let mut pending = lock(&self.pending);
        let before = pending.len();
        pending.retain(|n| n.identifier != identifier);
        if pending.len() == before {
            return Err(NotificationError::NotFound(identifier.to_string()));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
