//! Collaborator traits — the seams where the read model and the delivery
//! channel plug into the engine.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ProjectSummary, Task, User};

/// Read-only view over task/user state. Implementations must be
/// side-effect free; a wholesale failure here aborts the current pass.
#[async_trait]
pub trait TaskReadModel: Send + Sync {
    /// Tasks that could ever need a reminder: deadline present, lead time
    /// present, responsible present, status not done.
    async fn list_eligible_tasks(&self) -> Result<Vec<Task>>;

    /// Active users with a linked Telegram chat — the digest audience.
    async fn list_channel_linked_active_users(&self) -> Result<Vec<User>>;

    /// Responsible user for a task, if any.
    async fn get_responsible(&self, task_id: &str) -> Result<Option<User>>;

    /// Project the task belongs to, if any.
    async fn get_project(&self, task_id: &str) -> Result<Option<ProjectSummary>>;

    /// Every task assigned to a user, regardless of state. Digest
    /// aggregation computes its counts from this.
    async fn list_assigned_tasks(&self, user_id: &str) -> Result<Vec<Task>>;
}

/// Sends one rendered message to one chat. `Err` means the delivery
/// failed; the engine counts it and retries only on the next scheduled
/// pass, never in-pass.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()>;
}
