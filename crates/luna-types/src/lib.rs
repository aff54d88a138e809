//! Core types shared across the luna crates
//!
//! Wire models for the Luna Villa backend plus the constants every client
//! component agrees on.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Server used until the user configures one
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Default page size for chat history
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Settings keys persisted by the client
pub mod keys {
    pub const SERVER_URL: &str = "server_url";
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const DARK_MODE: &str = "dark_mode";
    pub const DEBUG_ENABLED: &str = "debug_enabled";
    pub const DEBUG_VIRTUAL_HOUR: &str = "debug_virtual_hour";
    pub const DEBUG_AFFINITY_OVERRIDE: &str = "debug_affinity_override";
}

// ============================================================================
// Helpers
// ============================================================================

/// Helper function to deserialize string or null values
pub fn deserialize_string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Parse the timestamp formats the backend emits ("2026-02-17T10:00",
/// "2026-02-17T10:00:00", "2026-02-17 10:00:00").
pub fn parse_server_timestamp(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let value = value.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

// ============================================================================
// Authentication
// ============================================================================

/// Outcome of a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginResult {
    Success,
    WrongPassword,
    NetworkError,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

// ============================================================================
// Chat
// ============================================================================

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub image_data: Vec<String>,
}

/// One stored conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: i64,
    pub role: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub content: String,
    #[serde(default)]
    pub is_memo: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ============================================================================
// Memos
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memo {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub title: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub event_id: Option<i64>,
    /// YYYY-MM-DD
    #[serde(default)]
    pub due_date: Option<String>,
    /// HH:MM
    #[serde(default)]
    pub due_time: Option<String>,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub event_title: Option<String>,
}

impl Task {
    /// Combined due date and time; `None` unless both are present and valid.
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.due_date.as_deref()?, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(self.due_time.as_deref()?, "%H:%M").ok()?;
        Some(date.and_time(time))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
}

/// Monthly completion summary entry; shape is owned by the server.
pub type TaskHistoryEntry = serde_json::Value;

// ============================================================================
// Calendar
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    #[serde(deserialize_with = "deserialize_string_or_null", default)]
    pub description: String,
    pub start_at: String,
    #[serde(default)]
    pub end_at: Option<String>,
    #[serde(default)]
    pub added_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl CalendarEvent {
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        parse_server_timestamp(&self.start_at)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub start_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
    pub added_by: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EventUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affinity {
    pub level: i64,
    pub exp: i64,
    pub rank: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub total_messages: i64,
    pub user_messages: i64,
    pub luna_messages: i64,
    pub affinity: Affinity,
}

/// Generic `{"id": .., "message": ..}` acknowledgement from mutating endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_task_due_at_requires_date_and_time() {
        let mut task: Task = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Laundry",
            "due_date": "2026-10-17",
            "due_time": "21:30",
        }))
        .unwrap();

        let due = task.due_at().unwrap();
        assert_eq!(due.to_string(), "2026-10-17 21:30:00");

        task.due_time = None;
        assert!(task.due_at().is_none());
    }

    #[test]
    fn test_parse_server_timestamp_formats() {
        for value in [
            "2026-02-17T10:00",
            "2026-02-17T10:00:00",
            "2026-02-17 10:00:00",
            " 2026-02-17T10:00:00.000 ",
        ] {
            let parsed = parse_server_timestamp(value).unwrap();
            assert_eq!(parsed.to_string(), "2026-02-17 10:00:00", "{value}");
        }
        assert!(parse_server_timestamp("tomorrow").is_none());
    }

    #[test]
    fn test_memo_tolerates_null_title() {
        let memo: Memo = serde_json::from_str(
            r#"{"id": 1, "title": null, "content": "souvenir idea", "created_at": "2026-01-01"}"#,
        )
        .unwrap();
        assert_eq!(memo.title, "");
        assert_eq!(memo.content, "souvenir idea");
    }

    #[test]
    fn test_updates_skip_unset_fields() {
        let update = TaskUpdate {
            is_done: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"is_done": true})
        );
    }
}
