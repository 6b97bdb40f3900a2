//! Test doubles for the collaborator traits.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use taskping_core::{
    DeliveryAdapter, ProjectSummary, Result, Task, TaskPingError, TaskReadModel, User,
};

/// In-memory read model seeded directly by tests.
#[derive(Default)]
pub struct MockReadModel {
    pub tasks: Vec<Task>,
    pub users: Vec<User>,
    pub responsible: HashMap<String, User>,
    pub projects: HashMap<String, ProjectSummary>,
    pub assigned: HashMap<String, Vec<Task>>,
    /// Simulate the read model being wholesale unreachable.
    pub fail_listing: bool,
}

#[async_trait]
impl TaskReadModel for MockReadModel {
    async fn list_eligible_tasks(&self) -> Result<Vec<Task>> {
        if self.fail_listing {
            return Err(TaskPingError::ReadModel("read model unreachable".into()));
        }
        Ok(self.tasks.clone())
    }

    async fn list_channel_linked_active_users(&self) -> Result<Vec<User>> {
        if self.fail_listing {
            return Err(TaskPingError::ReadModel("read model unreachable".into()));
        }
        Ok(self.users.clone())
    }

    async fn get_responsible(&self, task_id: &str) -> Result<Option<User>> {
        Ok(self.responsible.get(task_id).cloned())
    }

    async fn get_project(&self, task_id: &str) -> Result<Option<ProjectSummary>> {
        Ok(self.projects.get(task_id).cloned())
    }

    async fn list_assigned_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        Ok(self.assigned.get(user_id).cloned().unwrap_or_default())
    }
}

/// Delivery adapter that records every send and can fail per chat.
#[derive(Default)]
pub struct MockDelivery {
    sent: Mutex<Vec<(i64, String)>>,
    failing_chats: HashSet<i64>,
}

impl MockDelivery {
    /// All deliveries to this chat id will return an error.
    pub fn fail_for_chat(&mut self, chat_id: i64) {
        self.failing_chats.insert(chat_id);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryAdapter for MockDelivery {
    async fn send(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.failing_chats.contains(&chat_id) {
            return Err(TaskPingError::Channel("simulated delivery failure".into()));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}
