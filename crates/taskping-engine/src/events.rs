//! One-shot event notifications — fired by the CRUD side at mutation time
//! (task created, status changed, completed), sharing the render → deliver
//! → record path and the missing-chat-id no-op rule with the scanner.

use std::sync::Arc;

use chrono::Utc;

use taskping_core::types::TaskStatus;
use taskping_core::{
    DeliveryAdapter, NotificationKind, NotificationRecord, ProjectSummary, Result, Task, User,
};
use taskping_db::NotificationLedger;

use crate::render;

pub struct EventNotifier {
    ledger: Arc<NotificationLedger>,
    delivery: Arc<dyn DeliveryAdapter>,
}

impl EventNotifier {
    pub fn new(ledger: Arc<NotificationLedger>, delivery: Arc<dyn DeliveryAdapter>) -> Self {
        Self { ledger, delivery }
    }

    /// Tell the responsible user about a newly assigned task.
    /// Returns false when the recipient is unreachable (a no-op, not an
    /// error).
    pub async fn notify_new_task(
        &self,
        task: &Task,
        responsible: &User,
        project: Option<&ProjectSummary>,
        creator_name: &str,
    ) -> Result<bool> {
        let message =
            render::new_task_message(task, project.map(|p| p.name.as_str()), creator_name);
        self.deliver(task, responsible, NotificationKind::NewTask, &message)
            .await
    }

    /// Tell a recipient about a status change they did not make themselves.
    pub async fn notify_status_change(
        &self,
        task: &Task,
        recipient: &User,
        project: Option<&ProjectSummary>,
        old_status: TaskStatus,
        new_status: TaskStatus,
        changed_by: &str,
    ) -> Result<bool> {
        let message = render::status_change_message(
            task,
            project.map(|p| p.name.as_str()),
            old_status,
            new_status,
            changed_by,
        );
        self.deliver(task, recipient, NotificationKind::StatusChange, &message)
            .await
    }

    /// Tell the project owner a task in their project was completed.
    pub async fn notify_task_completed(
        &self,
        task: &Task,
        owner: &User,
        project: Option<&ProjectSummary>,
        completed_by: &str,
    ) -> Result<bool> {
        let message =
            render::completed_message(task, project.map(|p| p.name.as_str()), completed_by);
        self.deliver(task, owner, NotificationKind::Completed, &message)
            .await
    }

    async fn deliver(
        &self,
        task: &Task,
        recipient: &User,
        kind: NotificationKind,
        message: &str,
    ) -> Result<bool> {
        let Some(chat_id) = recipient.telegram_chat_id else {
            tracing::debug!(user_id = %recipient.id, kind = ?kind, "recipient has no linked chat, skipping");
            return Ok(false);
        };

        self.delivery.send(chat_id, message).await?;

        let record =
            NotificationRecord::new(&recipient.id, Some(&task.id), kind, message, Utc::now());
        if let Err(e) = self.ledger.append(&record) {
            tracing::warn!(task_id = %task.id, error = %e, "event notice delivered but not recorded");
        }
        Ok(true)
    }
}
