//! Read-only SQLite view over the task/user/project tables.
//!
//! The CRUD side of the product owns these tables; the engine only reads
//! them. Every query here is side-effect free. Unknown status/priority
//! strings surface as data-integrity errors instead of default labels.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;

use taskping_core::{
    Priority, ProjectSummary, Result, Task, TaskPingError, TaskReadModel, TaskStatus, User,
};

use crate::decode_ts;

pub struct SqliteReadModel {
    conn: Mutex<Connection>,
}

const TASK_COLUMNS: &str = "id, title, description, deadline, reminder_lead_hours, \
     status, priority, responsible_id, project_id, completed_at";

impl SqliteReadModel {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| TaskPingError::ReadModel(format!("open {}: {e}", path.display())))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| TaskPingError::ReadModel(format!("busy_timeout: {e}")))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory instance, for tests. The caller seeds tables through
    /// [`crate::schema::init_schema_on`].
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TaskPingError::ReadModel(format!("connection lock poisoned: {e}")))
    }

    fn query_tasks(&self, where_clause: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Task>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE {where_clause}");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TaskPingError::ReadModel(format!("prepare tasks query: {e}")))?;

        let raw: Vec<RawTask> = stmt
            .query_map(params, |row| {
                Ok(RawTask {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    deadline: row.get(3)?,
                    reminder_lead_hours: row.get(4)?,
                    status: row.get(5)?,
                    priority: row.get(6)?,
                    responsible_id: row.get(7)?,
                    project_id: row.get(8)?,
                    completed_at: row.get(9)?,
                })
            })
            .map_err(|e| TaskPingError::ReadModel(format!("tasks query: {e}")))?
            .collect::<rusqlite::Result<_>>()
            .map_err(|e| TaskPingError::ReadModel(format!("tasks query: {e}")))?;

        raw.into_iter().map(RawTask::into_task).collect()
    }
}

#[async_trait]
impl TaskReadModel for SqliteReadModel {
    async fn list_eligible_tasks(&self) -> Result<Vec<Task>> {
        self.query_tasks(
            "deadline IS NOT NULL
               AND reminder_lead_hours IS NOT NULL
               AND responsible_id IS NOT NULL
               AND status != 'done'",
            &[],
        )
    }

    async fn list_channel_linked_active_users(&self) -> Result<Vec<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, full_name, telegram_chat_id, active, role
                 FROM users
                 WHERE telegram_chat_id IS NOT NULL AND active = 1",
            )
            .map_err(|e| TaskPingError::ReadModel(format!("prepare users query: {e}")))?;

        stmt.query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                full_name: row.get(1)?,
                telegram_chat_id: row.get(2)?,
                active: row.get::<_, i64>(3)? != 0,
                role: row.get(4)?,
            })
        })
        .map_err(|e| TaskPingError::ReadModel(format!("users query: {e}")))?
        .collect::<rusqlite::Result<_>>()
        .map_err(|e| TaskPingError::ReadModel(format!("users query: {e}")))
    }

    async fn get_responsible(&self, task_id: &str) -> Result<Option<User>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT u.id, u.full_name, u.telegram_chat_id, u.active, u.role
                 FROM users u
                 JOIN tasks t ON t.responsible_id = u.id
                 WHERE t.id = ?1",
            )
            .map_err(|e| TaskPingError::ReadModel(format!("prepare responsible query: {e}")))?;

        let mut rows = stmt
            .query_map([task_id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    telegram_chat_id: row.get(2)?,
                    active: row.get::<_, i64>(3)? != 0,
                    role: row.get(4)?,
                })
            })
            .map_err(|e| TaskPingError::ReadModel(format!("responsible query: {e}")))?;

        rows.next()
            .transpose()
            .map_err(|e| TaskPingError::ReadModel(format!("responsible query: {e}")))
    }

    async fn get_project(&self, task_id: &str) -> Result<Option<ProjectSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT p.id, p.name
                 FROM projects p
                 JOIN tasks t ON t.project_id = p.id
                 WHERE t.id = ?1",
            )
            .map_err(|e| TaskPingError::ReadModel(format!("prepare project query: {e}")))?;

        let mut rows = stmt
            .query_map([task_id], |row| {
                Ok(ProjectSummary { id: row.get(0)?, name: row.get(1)? })
            })
            .map_err(|e| TaskPingError::ReadModel(format!("project query: {e}")))?;

        rows.next()
            .transpose()
            .map_err(|e| TaskPingError::ReadModel(format!("project query: {e}")))
    }

    async fn list_assigned_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        self.query_tasks("responsible_id = ?1", &[&user_id])
    }
}

struct RawTask {
    id: String,
    title: String,
    description: Option<String>,
    deadline: Option<String>,
    reminder_lead_hours: Option<i64>,
    status: String,
    priority: String,
    responsible_id: Option<String>,
    project_id: Option<String>,
    completed_at: Option<String>,
}

impl RawTask {
    fn into_task(self) -> Result<Task> {
        Ok(Task {
            status: TaskStatus::parse(&self.status)?,
            priority: Priority::parse(&self.priority)?,
            deadline: self.deadline.as_deref().map(decode_ts).transpose()?,
            completed_at: self.completed_at.as_deref().map(decode_ts).transpose()?,
            id: self.id,
            title: self.title,
            description: self.description,
            reminder_lead_hours: self.reminder_lead_hours,
            responsible_id: self.responsible_id,
            project_id: self.project_id,
        })
    }
}
