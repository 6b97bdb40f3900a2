//! Reminder scanner — one pass over eligible tasks.
//!
//! For every task whose reminder window is open right now: consult the
//! ledger, resolve the responsible user, render, deliver, record. One
//! task's failure never aborts the pass; a wholesale read-model failure
//! does, and escalates to the caller.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;

use taskping_core::config::EngineConfig;
use taskping_core::{DeliveryAdapter, NotificationKind, NotificationRecord, Result, Task, TaskReadModel};
use taskping_db::{AppendOutcome, NotificationLedger};

use crate::report::{tally, ItemOutcome, RunReport};
use crate::window::{self, WINDOW_HOURS};
use crate::render;

pub struct ReminderScanner {
    read_model: Arc<dyn TaskReadModel>,
    ledger: Arc<NotificationLedger>,
    delivery: Arc<dyn DeliveryAdapter>,
    config: EngineConfig,
}

impl ReminderScanner {
    pub fn new(
        read_model: Arc<dyn TaskReadModel>,
        ledger: Arc<NotificationLedger>,
        delivery: Arc<dyn DeliveryAdapter>,
        config: EngineConfig,
    ) -> Self {
        Self { read_model, ledger, delivery, config }
    }

    /// Run one reminder pass at instant `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let tasks = self.read_model.list_eligible_tasks().await?;
        let scanned = tasks.len();

        let due: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.is_due_now(task, now))
            .collect();

        tracing::debug!(scanned, due = due.len(), "reminder scan pass");

        // Distinct tasks only, so concurrent ledger check-then-append
        // sequences never race on the same task within this pass. A race
        // against an overlapping pass degrades to a Duplicate append.
        let outcomes: Vec<ItemOutcome> = futures::stream::iter(due)
            .map(|task| self.process_task(task, now))
            .buffer_unordered(self.config.max_concurrent_sends.max(1))
            .collect()
            .await;

        let (sent, errors) = tally(&outcomes);
        let report = RunReport::new(scanned, sent, errors, now);
        tracing::info!(
            scanned = report.scanned,
            sent = report.sent,
            errors = report.errors,
            "reminder scan complete"
        );
        Ok(report)
    }

    fn is_due_now(&self, task: &Task, now: DateTime<Utc>) -> bool {
        // Eligibility (deadline + responsible present) is the read model's
        // contract; missing fields here are valid state, silently skipped.
        let (Some(deadline), Some(_)) = (task.deadline, task.responsible_id.as_ref()) else {
            return false;
        };
        let lead = task
            .reminder_lead_hours
            .unwrap_or(self.config.default_lead_hours);
        window::is_due(deadline, lead, now)
    }

    async fn process_task(&self, task: Task, now: DateTime<Utc>) -> ItemOutcome {
        match self.try_process_task(&task, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "reminder failed");
                ItemOutcome::Errored
            }
        }
    }

    async fn try_process_task(&self, task: &Task, now: DateTime<Utc>) -> Result<ItemOutcome> {
        let deadline = match task.deadline {
            Some(d) => d,
            None => return Ok(ItemOutcome::Skipped),
        };
        let lead = task
            .reminder_lead_hours
            .unwrap_or(self.config.default_lead_hours);
        let window_start = window::window_start(deadline, lead);

        // Dedup guard: anything recorded since an hour before this window
        // opened means the reminder was already handled (covers a re-run
        // of the same slot, retries, and manual re-triggers).
        let since = window_start - Duration::hours(WINDOW_HOURS);
        if self
            .ledger
            .exists(&task.id, NotificationKind::Reminder, since)?
        {
            tracing::debug!(task_id = %task.id, "reminder already sent for this window");
            return Ok(ItemOutcome::Skipped);
        }

        let Some(user) = self.read_model.get_responsible(&task.id).await? else {
            tracing::debug!(task_id = %task.id, "no responsible user, skipping");
            return Ok(ItemOutcome::Skipped);
        };
        let Some(chat_id) = user.telegram_chat_id else {
            tracing::debug!(task_id = %task.id, user_id = %user.id, "user has no linked chat, skipping");
            return Ok(ItemOutcome::Skipped);
        };

        let project = self.read_model.get_project(&task.id).await?;
        let message = render::reminder_message(task, project.as_ref().map(|p| p.name.as_str()), now);

        self.delivery.send(chat_id, &message).await?;

        let record = NotificationRecord::new(
            &user.id,
            Some(&task.id),
            NotificationKind::Reminder,
            &message,
            now,
        )
        .with_window_start(window_start);

        match self.ledger.append(&record) {
            Ok(AppendOutcome::Appended) => {
                tracing::info!(task_id = %task.id, user_id = %user.id, "reminder sent");
                Ok(ItemOutcome::Sent)
            }
            Ok(AppendOutcome::Duplicate) => {
                // An overlapping pass committed first. The user may have
                // received two messages; the ledger keeps exactly one row.
                tracing::debug!(task_id = %task.id, "concurrent pass already recorded this reminder");
                Ok(ItemOutcome::Sent)
            }
            Err(e) => {
                // Delivered but not recorded. Accepting a possible re-send
                // on a later pass over double-sending before the dedup
                // check was the recorded tradeoff.
                tracing::warn!(task_id = %task.id, error = %e, "reminder delivered but not recorded");
                Ok(ItemOutcome::Errored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockDelivery, MockReadModel};
    use chrono::TimeZone;
    use taskping_core::types::{Priority, TaskStatus};
    use taskping_core::User;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap()
    }

    fn task(id: &str, deadline: DateTime<Utc>, lead: i64) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: None,
            deadline: Some(deadline),
            reminder_lead_hours: Some(lead),
            status: TaskStatus::InProgress,
            priority: Priority::Medium,
            responsible_id: Some("u1".into()),
            project_id: None,
            completed_at: None,
        }
    }

    fn linked_user(id: &str, chat_id: i64) -> User {
        User {
            id: id.into(),
            full_name: "Ada".into(),
            telegram_chat_id: Some(chat_id),
            active: true,
            role: "member".into(),
        }
    }

    fn scanner(
        read_model: MockReadModel,
        delivery: MockDelivery,
    ) -> (ReminderScanner, Arc<NotificationLedger>, Arc<MockDelivery>) {
        let ledger = Arc::new(NotificationLedger::open_in_memory().unwrap());
        let delivery = Arc::new(delivery);
        let scanner = ReminderScanner::new(
            Arc::new(read_model),
            Arc::clone(&ledger),
            delivery.clone() as Arc<dyn DeliveryAdapter>,
            EngineConfig::default(),
        );
        (scanner, ledger, delivery)
    }

    #[tokio::test]
    async fn due_task_sends_once_and_rescan_sends_zero() {
        // Scenario A: deadline = now+24h, lead = 24h → due now.
        let t = task("t1", now() + Duration::hours(24), 24);
        let mut model = MockReadModel::default();
        model.tasks = vec![t];
        model.responsible.insert("t1".into(), linked_user("u1", 100));
        let (scanner, ledger, delivery) = scanner(model, MockDelivery::default());

        let first = scanner.run(now()).await.unwrap();
        assert_eq!((first.scanned, first.sent, first.errors), (1, 1, 0));
        assert_eq!(ledger.count().unwrap(), 1);
        assert_eq!(delivery.sent_count(), 1);

        let second = scanner.run(now()).await.unwrap();
        assert_eq!((second.scanned, second.sent, second.errors), (1, 0, 0));
        assert_eq!(ledger.count().unwrap(), 1);
        assert_eq!(delivery.sent_count(), 1);
    }

    #[tokio::test]
    async fn window_already_passed_is_not_due() {
        // Scenario B: deadline = now+2h, lead = 24h → window closed 21h ago.
        let t = task("t1", now() + Duration::hours(2), 24);
        let mut model = MockReadModel::default();
        model.tasks = vec![t];
        model.responsible.insert("t1".into(), linked_user("u1", 100));
        let (scanner, ledger, delivery) = scanner(model, MockDelivery::default());

        let report = scanner.run(now()).await.unwrap();
        assert_eq!((report.scanned, report.sent, report.errors), (1, 0, 0));
        assert_eq!(ledger.count().unwrap(), 0);
        assert_eq!(delivery.sent_count(), 0);
    }

    #[tokio::test]
    async fn unreachable_user_is_a_silent_skip() {
        let t = task("t1", now() + Duration::hours(24), 24);
        let mut model = MockReadModel::default();
        model.tasks = vec![t];
        let mut user = linked_user("u1", 100);
        user.telegram_chat_id = None;
        model.responsible.insert("t1".into(), user);
        let (scanner, ledger, delivery) = scanner(model, MockDelivery::default());

        let report = scanner.run(now()).await.unwrap();
        assert_eq!((report.sent, report.errors), (0, 0));
        assert_eq!(ledger.count().unwrap(), 0);
        assert_eq!(delivery.sent_count(), 0);
    }

    #[tokio::test]
    async fn missing_responsible_never_touches_ledger_or_delivery() {
        let mut t = task("t1", now() + Duration::hours(24), 24);
        t.responsible_id = None;
        let mut model = MockReadModel::default();
        model.tasks = vec![t];
        let (scanner, ledger, delivery) = scanner(model, MockDelivery::default());

        let report = scanner.run(now()).await.unwrap();
        assert_eq!((report.scanned, report.sent, report.errors), (1, 0, 0));
        assert_eq!(ledger.count().unwrap(), 0);
        assert_eq!(delivery.sent_count(), 0);
    }

    #[tokio::test]
    async fn one_delivery_failure_does_not_abort_the_pass() {
        // Scenario D: three due tasks, one delivery fails.
        let mut model = MockReadModel::default();
        for (i, chat) in [(1, 100), (2, 200), (3, 300)] {
            let id = format!("t{i}");
            model.tasks.push(task(&id, now() + Duration::hours(24), 24));
            model.responsible.insert(id, linked_user(&format!("u{i}"), chat));
        }
        let mut delivery = MockDelivery::default();
        delivery.fail_for_chat(200);
        let (scanner, ledger, _delivery) = scanner(model, delivery);

        let report = scanner.run(now()).await.unwrap();
        assert_eq!((report.scanned, report.sent, report.errors), (3, 2, 1));
        // No ledger record for the failed send.
        assert_eq!(ledger.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn default_lead_applies_when_task_has_none() {
        let mut t = task("t1", now() + Duration::hours(24), 24);
        t.reminder_lead_hours = None; // default 24h → due now
        let mut model = MockReadModel::default();
        model.tasks = vec![t];
        model.responsible.insert("t1".into(), linked_user("u1", 100));
        let (scanner, _ledger, delivery) = scanner(model, MockDelivery::default());

        let report = scanner.run(now()).await.unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(delivery.sent_count(), 1);
    }

    #[tokio::test]
    async fn read_model_failure_escalates() {
        let mut model = MockReadModel::default();
        model.fail_listing = true;
        let (scanner, _ledger, _delivery) = scanner(model, MockDelivery::default());
        assert!(scanner.run(now()).await.is_err());
    }
}
