//! The scheduler loop — fires engine passes on their cron cadences.
//!
//! At-least-once per slot: if a pass is slow, the next tick fires the next
//! slot regardless, and the ledger absorbs any resulting duplicate
//! reminder attempt. A failed pass is logged and the loop keeps going.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use taskping_core::config::ScheduleConfig;
use taskping_engine::{DigestAggregator, DigestKind, ReminderScanner, RunReport};

use crate::cron;

/// What a scheduled slot runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    ReminderScan,
    DailyDigest,
    WeeklyDigest,
}

impl JobKind {
    fn name(&self) -> &'static str {
        match self {
            Self::ReminderScan => "reminder-scan",
            Self::DailyDigest => "daily-digest",
            Self::WeeklyDigest => "weekly-digest",
        }
    }
}

struct Job {
    kind: JobKind,
    expression: String,
    next_run: Option<DateTime<Utc>>,
}

pub struct Scheduler {
    jobs: Vec<Job>,
    scanner: Arc<ReminderScanner>,
    aggregator: Arc<DigestAggregator>,
    tick_secs: u64,
}

impl Scheduler {
    /// Build the three standard jobs from config cadences.
    pub fn new(
        config: &ScheduleConfig,
        scanner: Arc<ReminderScanner>,
        aggregator: Arc<DigestAggregator>,
    ) -> Self {
        let now = Utc::now();
        let jobs = vec![
            Job::new(JobKind::ReminderScan, &config.reminder_cron, now),
            Job::new(JobKind::DailyDigest, &config.daily_digest_cron, now),
            Job::new(JobKind::WeeklyDigest, &config.weekly_digest_cron, now),
        ];
        for job in &jobs {
            match job.next_run {
                Some(next) => {
                    tracing::info!(job = job.kind.name(), cron = %job.expression, %next, "job scheduled")
                }
                None => {
                    tracing::error!(job = job.kind.name(), cron = %job.expression, "invalid cron, job disabled")
                }
            }
        }
        Self {
            jobs,
            scanner,
            aggregator,
            tick_secs: config.tick_secs,
        }
    }

    /// Run the loop forever. Each tick fires every job whose slot has
    /// passed, then reschedules it.
    pub async fn run(mut self) {
        tracing::info!(tick_secs = self.tick_secs, "scheduler started");
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(self.tick_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.tick(Utc::now()).await;
        }
    }

    /// One pass over the job table. Public for tests.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Vec<(JobKind, RunReport)> {
        let mut fired = Vec::new();
        for i in 0..self.jobs.len() {
            let due = matches!(self.jobs[i].next_run, Some(next) if next <= now);
            if !due {
                continue;
            }

            let kind = self.jobs[i].kind;
            tracing::info!(job = kind.name(), "job triggered");
            match self.fire(kind, now).await {
                Ok(report) => fired.push((kind, report)),
                Err(e) => {
                    tracing::error!(job = kind.name(), error = %e, "pass failed");
                }
            }

            // Reschedule from now, not from the slot, so a long pass does
            // not immediately re-fire the same expression.
            self.jobs[i].next_run = cron::next_run_from_cron(&self.jobs[i].expression, now);
        }
        fired
    }

    async fn fire(&self, kind: JobKind, now: DateTime<Utc>) -> taskping_core::Result<RunReport> {
        match kind {
            JobKind::ReminderScan => self.scanner.run(now).await,
            JobKind::DailyDigest => self.aggregator.run(DigestKind::Daily, now).await,
            JobKind::WeeklyDigest => self.aggregator.run(DigestKind::Weekly, now).await,
        }
    }
}

impl Job {
    fn new(kind: JobKind, expression: &str, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            expression: expression.to_string(),
            next_run: cron::next_run_from_cron(expression, now),
        }
    }
}
