//! Domain types — tasks and users as the engine reads them, plus the
//! notification records it owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskPingError};

/// Task lifecycle status. Closed set — an unknown storage value is a
/// data-integrity error, never silently mapped to a default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(TaskPingError::Data(format!("unknown task status: {other:?}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Display label with status glyph, for rendered messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "⚪ Not started",
            Self::InProgress => "🔵 In progress",
            Self::Done => "✅ Done",
        }
    }
}

/// Task priority. Same closed-set rule as [`TaskStatus`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(TaskPingError::Data(format!("unknown priority: {other:?}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Low => "🟢",
            Self::Medium => "🟡",
            Self::High => "🔴",
        }
    }
}

/// A task as seen by the notification engine. Read-only here: the engine
/// never mutates business fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Deadline in UTC. No deadline means never reminder-eligible.
    pub deadline: Option<DateTime<Utc>>,
    /// Hours before the deadline at which the reminder window opens.
    pub reminder_lead_hours: Option<i64>,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Responsible user. None means never reminder-eligible.
    pub responsible_id: Option<String>,
    pub project_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A user as seen by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    /// Telegram chat id. Presence means the user is reachable.
    pub telegram_chat_id: Option<i64>,
    pub active: bool,
    pub role: String,
}

impl User {
    /// Whether this user can receive notifications at all.
    pub fn is_reachable(&self) -> bool {
        self.active && self.telegram_chat_id.is_some()
    }
}

/// Minimal project info needed for message rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
}

/// What kind of notification a ledger record represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewTask,
    Reminder,
    Completed,
    DailyDigest,
    WeeklyDigest,
    StatusChange,
}

impl NotificationKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "new_task" => Ok(Self::NewTask),
            "reminder" => Ok(Self::Reminder),
            "completed" => Ok(Self::Completed),
            "daily_digest" => Ok(Self::DailyDigest),
            "weekly_digest" => Ok(Self::WeeklyDigest),
            "status_change" => Ok(Self::StatusChange),
            other => Err(TaskPingError::Data(format!(
                "unknown notification kind: {other:?}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewTask => "new_task",
            Self::Reminder => "reminder",
            Self::Completed => "completed",
            Self::DailyDigest => "daily_digest",
            Self::WeeklyDigest => "weekly_digest",
            Self::StatusChange => "status_change",
        }
    }
}

/// One append-only record of a delivered notification. Created exactly
/// once per successful send; never updated or deleted by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub task_id: Option<String>,
    pub kind: NotificationKind,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    /// Reminder-window anchor. Set for `Reminder` records; part of the
    /// dedup key (task_id, kind, window_start).
    pub window_start: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Build a record with a fresh id, stamped now.
    pub fn new(
        user_id: &str,
        task_id: Option<&str>,
        kind: NotificationKind,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            task_id: task_id.map(|t| t.to_string()),
            kind,
            message: message.to_string(),
            sent_at,
            read_at: None,
            window_start: None,
        }
    }

    pub fn with_window_start(mut self, window_start: DateTime<Utc>) -> Self {
        self.window_start = Some(window_start);
        self
    }
}
