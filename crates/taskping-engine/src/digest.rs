//! Digest aggregation — per-user daily and weekly summaries.
//!
//! Stats are computed from the user's full assigned-task list, rendered,
//! delivered, and recorded. Users are independent failure domains: one
//! failed send never blocks another user's digest. Digests are not
//! window-deduplicated; firing each cadence slot once is the scheduler's
//! job.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use futures::StreamExt;

use taskping_core::config::EngineConfig;
use taskping_core::{
    DeliveryAdapter, NotificationKind, NotificationRecord, Result, Task, TaskReadModel, TaskStatus,
    User,
};
use taskping_db::NotificationLedger;

use crate::render;
use crate::report::{tally, ItemOutcome, RunReport};

/// Daily counts for one user.
#[derive(Debug, Clone)]
pub struct DailyStats {
    /// Not-done tasks with a deadline inside today's UTC day, ascending.
    pub due_today: Vec<Task>,
    pub not_started: usize,
    pub in_progress: usize,
    /// Deadline in the past and not done.
    pub overdue: usize,
}

/// Weekly counts for one user. Weeks are Monday-anchored, UTC.
#[derive(Debug, Clone)]
pub struct WeeklyStats {
    /// Tasks whose completion timestamp falls in the previous week.
    pub completed_last_week: usize,
    /// Not-done tasks due inside the current week, ascending by deadline.
    pub due_this_week: Vec<Task>,
    pub overdue: usize,
    pub total_assigned: usize,
    pub total_completed: usize,
}

impl WeeklyStats {
    /// Lifetime completion percentage. 0.0 when nothing is assigned.
    pub fn completion_rate(&self) -> f64 {
        if self.total_assigned == 0 {
            0.0
        } else {
            self.total_completed as f64 / self.total_assigned as f64 * 100.0
        }
    }
}

fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    day_start(now) - Duration::days(now.weekday().num_days_from_monday() as i64)
}

/// Compute daily stats from a user's assigned tasks.
pub fn daily_stats(tasks: &[Task], now: DateTime<Utc>) -> DailyStats {
    let today = day_start(now);
    let tomorrow = today + Duration::days(1);

    let mut due_today: Vec<Task> = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done)
        .filter(|t| t.deadline.is_some_and(|d| d >= today && d < tomorrow))
        .cloned()
        .collect();
    due_today.sort_by_key(|t| t.deadline);

    DailyStats {
        due_today,
        not_started: tasks.iter().filter(|t| t.status == TaskStatus::NotStarted).count(),
        in_progress: tasks.iter().filter(|t| t.status == TaskStatus::InProgress).count(),
        overdue: overdue_count(tasks, now),
    }
}

/// Compute weekly stats from a user's assigned tasks.
pub fn weekly_stats(tasks: &[Task], now: DateTime<Utc>) -> WeeklyStats {
    let this_week = week_start(now);
    let next_week = this_week + Duration::days(7);
    let last_week = this_week - Duration::days(7);

    let completed_last_week = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .filter(|t| t.completed_at.is_some_and(|c| c >= last_week && c < this_week))
        .count();

    let mut due_this_week: Vec<Task> = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done)
        .filter(|t| t.deadline.is_some_and(|d| d >= this_week && d < next_week))
        .cloned()
        .collect();
    due_this_week.sort_by_key(|t| t.deadline);

    WeeklyStats {
        completed_last_week,
        due_this_week,
        overdue: overdue_count(tasks, now),
        total_assigned: tasks.len(),
        total_completed: tasks.iter().filter(|t| t.status == TaskStatus::Done).count(),
    }
}

fn overdue_count(tasks: &[Task], now: DateTime<Utc>) -> usize {
    tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Done)
        .filter(|t| t.deadline.is_some_and(|d| d < now))
        .count()
}

/// Which digest a pass produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Daily,
    Weekly,
}

pub struct DigestAggregator {
    read_model: Arc<dyn TaskReadModel>,
    ledger: Arc<NotificationLedger>,
    delivery: Arc<dyn DeliveryAdapter>,
    config: EngineConfig,
}

impl DigestAggregator {
    pub fn new(
        read_model: Arc<dyn TaskReadModel>,
        ledger: Arc<NotificationLedger>,
        delivery: Arc<dyn DeliveryAdapter>,
        config: EngineConfig,
    ) -> Self {
        Self { read_model, ledger, delivery, config }
    }

    /// Run one digest pass of `kind` at instant `now`, over every active
    /// channel-linked user.
    pub async fn run(&self, kind: DigestKind, now: DateTime<Utc>) -> Result<RunReport> {
        let users = self.read_model.list_channel_linked_active_users().await?;
        let scanned = users.len();

        let outcomes: Vec<ItemOutcome> = futures::stream::iter(users)
            .map(|user| self.process_user(kind, user, now))
            .buffer_unordered(self.config.max_concurrent_sends.max(1))
            .collect()
            .await;

        let (sent, errors) = tally(&outcomes);
        let report = RunReport::new(scanned, sent, errors, now);
        tracing::info!(
            kind = ?kind,
            scanned = report.scanned,
            sent = report.sent,
            errors = report.errors,
            "digest pass complete"
        );
        Ok(report)
    }

    async fn process_user(&self, kind: DigestKind, user: User, now: DateTime<Utc>) -> ItemOutcome {
        match self.try_process_user(kind, &user, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(user_id = %user.id, kind = ?kind, error = %e, "digest failed");
                ItemOutcome::Errored
            }
        }
    }

    async fn try_process_user(
        &self,
        kind: DigestKind,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<ItemOutcome> {
        let Some(chat_id) = user.telegram_chat_id else {
            // The user list filters on linkage; tolerate a stale row.
            tracing::debug!(user_id = %user.id, "user not channel-linked, skipping digest");
            return Ok(ItemOutcome::Skipped);
        };

        let tasks = self.read_model.list_assigned_tasks(&user.id).await?;

        let (message, record_kind) = match kind {
            DigestKind::Daily => {
                let stats = daily_stats(&tasks, now);
                (
                    render::daily_digest_message(user, &stats, now, self.config.daily_digest_task_cap),
                    NotificationKind::DailyDigest,
                )
            }
            DigestKind::Weekly => {
                let stats = weekly_stats(&tasks, now);
                (
                    render::weekly_digest_message(user, &stats, self.config.weekly_digest_task_cap),
                    NotificationKind::WeeklyDigest,
                )
            }
        };

        self.delivery.send(chat_id, &message).await?;

        let record = NotificationRecord::new(&user.id, None, record_kind, &message, now);
        if let Err(e) = self.ledger.append(&record) {
            tracing::warn!(user_id = %user.id, error = %e, "digest delivered but not recorded");
            return Ok(ItemOutcome::Errored);
        }

        tracing::info!(user_id = %user.id, kind = ?kind, "digest sent");
        Ok(ItemOutcome::Sent)
    }
}
