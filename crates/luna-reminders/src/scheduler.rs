use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use luna_settings::Clock;
use serde_json::json;

use crate::notification::{NotificationCenter, NotificationContent, NotificationError};

/// Lead times most screens use: half an hour, ten minutes, and on time
pub const DEFAULT_OFFSETS_MINUTES: [i64; 3] = [30, 10, 0];

/// Payload `type` of entity reminders
pub const REMINDER_TYPE: &str = "reminder";

/// Reminders to schedule for one task or calendar event
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRequest {
    /// Caller-defined id, only used to find this entity's reminders again
    pub entity_id: i64,
    pub title: String,
    pub target_time: DateTime<Utc>,
    /// Minutes before `target_time`, in the order they should be scheduled
    pub offsets_minutes: Vec<i64>,
}

impl ReminderRequest {
    pub fn new(
        entity_id: i64,
        title: impl Into<String>,
        target_time: DateTime<Utc>,
        offsets_minutes: Vec<i64>,
    ) -> Self {
        Self {
            entity_id,
            title: title.into(),
            target_time,
            offsets_minutes,
        }
    }

    /// Build a request from a wall-clock time in the local timezone.
    ///
    /// Returns `None` for local times that do not exist (DST gaps).
    pub fn from_local(
        entity_id: i64,
        title: impl Into<String>,
        local: NaiveDateTime,
        offsets_minutes: Vec<i64>,
    ) -> Option<Self> {
        let target = Local.from_local_datetime(&local).earliest()?;
        Some(Self::new(
            entity_id,
            title,
            target.with_timezone(&Utc),
            offsets_minutes,
        ))
    }

    /// Trigger time for one offset, or `None` when it falls outside the
    /// representable date range.
    pub fn trigger_for(&self, minutes: i64) -> Option<DateTime<Utc>> {
        self.target_time.checked_sub_signed(Duration::try_minutes(minutes)?)
    }
}

/// Notification text for a reminder `minutes` ahead of `title`
pub fn reminder_content(entity_id: i64, title: &str, minutes: i64) -> NotificationContent {
    let (title, body) = if minutes == 0 {
        (
            format!("[It's time!] {} 🌙", title),
            "Right on time! Go on, get started ♡".to_string(),
        )
    } else {
        (
            format!("[{} min left] {} 🌙", minutes, title),
            "It's almost time. Are you ready? ♡".to_string(),
        )
    };
    NotificationContent {
        title,
        body,
        data: json!({ "id": entity_id, "type": REMINDER_TYPE, "minutes": minutes }),
    }
}

/// Special dates that get their own greeting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialOccasion {
    UserBirthday,
    LunaBirthday,
}

impl SpecialOccasion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialOccasion::UserBirthday => "user_birthday",
            SpecialOccasion::LunaBirthday => "luna_birthday",
        }
    }

    fn content(&self) -> NotificationContent {
        let (title, body) = match self {
            SpecialOccasion::UserBirthday => (
                "Happy birthday! ♡",
                "Today I'm spoiling you all day long, so be ready.",
            ),
            SpecialOccasion::LunaBirthday => (
                "Today is my birthday! ♡",
                "You'd better celebrate me more than anyone in the world.",
            ),
        };
        NotificationContent {
            title: title.to_string(),
            body: body.to_string(),
            data: json!({ "type": self.as_str(), "special": true }),
        }
    }
}

/// Turns target times and lead offsets into local notifications, keeping
/// at most one reminder set per entity.
pub struct ReminderScheduler {
    center: Arc<dyn NotificationCenter>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(center: Arc<dyn NotificationCenter>, clock: Arc<dyn Clock>) -> Self {
        Self { center, clock }
    }

    /// Replace the reminders of `request.entity_id` with a fresh set.
    ///
    /// Existing reminders for the entity are cancelled first. Offsets whose
    /// trigger is not strictly in the future, or cannot be represented at
    /// all, are skipped. Returns the
    /// identifiers of the notifications scheduled by this call.
    pub async fn schedule(&self, request: &ReminderRequest) -> Result<Vec<String>, NotificationError> {
        let cancelled = self.cancel_for_entity(request.entity_id).await?;
        if cancelled > 0 {
            log::debug!(
                "Cancelled {} stale reminder(s) for entity {}",
                cancelled,
                request.entity_id
            );
        }

        let now = self.clock.now();
        let mut identifiers = Vec::new();
        for &minutes in &request.offsets_minutes {
            let Some(trigger) = request.trigger_for(minutes) else {
                log::debug!(
                    "Skipping {}-minute reminder for entity {}: offset out of range",
                    minutes,
                    request.entity_id
                );
                continue;
            };
            if trigger <= now {
                log::debug!(
                    "Skipping {}-minute reminder for entity {}: {} already passed",
                    minutes,
                    request.entity_id,
                    trigger
                );
                continue;
            }

            let content = reminder_content(request.entity_id, &request.title, minutes);
            identifiers.push(self.center.schedule(content, Some(trigger)).await?);
        }

        log::info!(
            "Scheduled {} reminder(s) for entity {} ({})",
            identifiers.len(),
            request.entity_id,
            request.title
        );
        Ok(identifiers)
    }

    /// Cancel every pending notification whose payload id is `entity_id`.
    /// Returns how many were cancelled.
    pub async fn cancel_for_entity(&self, entity_id: i64) -> Result<usize, NotificationError> {
        let mut cancelled = 0;
        for notification in self.center.scheduled().await? {
            if notification.content.entity_id() == Some(entity_id) {
                self.center.cancel(&notification.identifier).await?;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    /// Fire a notification immediately, to check delivery works
    pub async fn schedule_test_notification(&self) -> Result<String, NotificationError> {
        let content = NotificationContent {
            title: "Hey there! 🌙".to_string(),
            body: "You haven't forgotten about me, have you? ♡".to_string(),
            data: json!({ "type": "test" }),
        };
        self.center.schedule(content, None).await
    }

    /// Schedule a special-date greeting. Dates already passed are skipped.
    pub async fn schedule_special(
        &self,
        occasion: SpecialOccasion,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, NotificationError> {
        if at <= self.clock.now() {
            return Ok(None);
        }
        let identifier = self.center.schedule(occasion.content(), Some(at)).await?;
        Ok(Some(identifier))
    }
}
