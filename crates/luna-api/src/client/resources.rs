//! Plain JSON endpoints: history, memos, tasks, calendar and stats.

use luna_types::{
    Ack, CalendarEvent, EventUpdate, HistoryMessage, Memo, MemoUpdate, NewEvent, NewTask, Stats,
    Task, TaskHistoryEntry, TaskUpdate,
};
use reqwest::Method;
use serde::Deserialize;

use super::ApiClient;
use crate::error::ApiError;

#[derive(Deserialize)]
struct HistoryPage {
    #[serde(default)]
    messages: Vec<HistoryMessage>,
}

#[derive(Deserialize)]
struct MemoList {
    #[serde(default)]
    memos: Vec<Memo>,
}

#[derive(Deserialize)]
struct TaskList {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct TaskHistory {
    #[serde(default)]
    history: Vec<TaskHistoryEntry>,
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    events: Vec<CalendarEvent>,
}

impl ApiClient {
    // ─── History ──────────────────

    /// Most recent messages, oldest first
    pub async fn history(&self, limit: u32) -> Result<Vec<HistoryMessage>, ApiError> {
        let request = self
            .request(Method::GET, "/api/history")
            .query(&[("limit", limit)]);
        let page: HistoryPage = self.execute(request).await?;
        Ok(page.messages)
    }

    // ─── Memos ────────────────────

    pub async fn memos(&self) -> Result<Vec<Memo>, ApiError> {
        let list: MemoList = self.execute(self.request(Method::GET, "/api/memos")).await?;
        Ok(list.memos)
    }

    pub async fn save_memo(&self, content: &str, title: &str) -> Result<Ack, ApiError> {
        let request = self
            .request(Method::POST, "/api/memos")
            .json(&serde_json::json!({ "content": content, "title": title }));
        self.execute(request).await
    }

    pub async fn update_memo(&self, id: i64, update: &MemoUpdate) -> Result<Ack, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/api/memos/{}", id))
            .json(update);
        self.execute(request).await
    }

    pub async fn delete_memo(&self, id: i64) -> Result<Ack, ApiError> {
        self.execute(self.request(Method::DELETE, &format!("/api/memos/{}", id)))
            .await
    }

    /// Forward a memo to the desktop companion
    pub async fn sync_memo_to_pc(&self, id: i64) -> Result<Ack, ApiError> {
        let request = self
            .request(Method::POST, "/api/memos/sync")
            .query(&[("memo_id", id)]);
        self.execute(request).await
    }

    // ─── Stats ────────────────────

    pub async fn stats(&self) -> Result<Stats, ApiError> {
        self.execute(self.request(Method::GET, "/api/stats")).await
    }

    // ─── Calendar ─────────────────

    /// Events for one month, or the upcoming ones when no month is given
    pub async fn events(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<CalendarEvent>, ApiError> {
        let mut request = self.request(Method::GET, "/api/calendar");
        if let (Some(year), Some(month)) = (year, month) {
            request = request.query(&[("year", year.to_string()), ("month", month.to_string())]);
        }
        let list: EventList = self.execute(request).await?;
        Ok(list.events)
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<Ack, ApiError> {
        let request = self.request(Method::POST, "/api/calendar").json(event);
        self.execute(request).await
    }

    pub async fn update_event(&self, id: i64, update: &EventUpdate) -> Result<Ack, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/api/calendar/{}", id))
            .json(update);
        self.execute(request).await
    }

    pub async fn delete_event(&self, id: i64) -> Result<Ack, ApiError> {
        self.execute(self.request(Method::DELETE, &format!("/api/calendar/{}", id)))
            .await
    }

    // ─── Tasks ────────────────────

    /// Tasks, optionally limited to one `YYYY-MM-DD` date
    pub async fn tasks(&self, date: Option<&str>, show_done: bool) -> Result<Vec<Task>, ApiError> {
        let mut request = self
            .request(Method::GET, "/api/tasks")
            .query(&[("show_done", show_done)]);
        if let Some(date) = date {
            request = request.query(&[("date", date)]);
        }
        let list: TaskList = self.execute(request).await?;
        Ok(list.tasks)
    }

    pub async fn task_history(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<Vec<TaskHistoryEntry>, ApiError> {
        let mut request = self.request(Method::GET, "/api/tasks/history");
        if let (Some(year), Some(month)) = (year, month) {
            request = request.query(&[("year", year.to_string()), ("month", month.to_string())]);
        }
        let history: TaskHistory = self.execute(request).await?;
        Ok(history.history)
    }

    pub async fn create_task(&self, task: &NewTask) -> Result<Ack, ApiError> {
        let request = self.request(Method::POST, "/api/tasks").json(task);
        self.execute(request).await
    }

    pub async fn update_task(&self, id: i64, update: &TaskUpdate) -> Result<Ack, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/api/tasks/{}", id))
            .json(update);
        self.execute(request).await
    }

    pub async fn delete_task(&self, id: i64) -> Result<Ack, ApiError> {
        self.execute(self.request(Method::DELETE, &format!("/api/tasks/{}", id)))
            .await
    }
}
