//! Local reminder scheduling for tasks and calendar events.
//!
//! `ReminderScheduler` computes trigger times from a target time and a list
//! of minutes-before offsets and hands them to a `NotificationCenter`.

pub mod notification;
pub mod scheduler;

pub use notification::{
    InMemoryNotificationCenter, NotificationCenter, NotificationContent, NotificationError,
    ScheduledNotification,
};
pub use scheduler::{
    reminder_content, ReminderRequest, ReminderScheduler, SpecialOccasion,
    DEFAULT_OFFSETS_MINUTES, REMINDER_TYPE,
};
