//! Business-table schema bootstrap.
//!
//! Owned by the CRUD side of the product in deployment; created here only
//! as a development convenience (`taskping init-db`) and for tests.

use std::path::Path;

use rusqlite::Connection;
use taskping_core::{Result, TaskPingError};

/// Create the tasks/users/projects tables if absent.
pub fn init_schema(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)
        .map_err(|e| TaskPingError::ReadModel(format!("open {}: {e}", path.display())))?;
    init_schema_on(&conn)
}

/// Same, on an already open connection (tests use in-memory connections).
pub fn init_schema_on(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            telegram_chat_id INTEGER,
            active INTEGER NOT NULL DEFAULT 1,
            role TEXT NOT NULL DEFAULT 'member'
        );

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            deadline TEXT,
            reminder_lead_hours INTEGER,
            status TEXT NOT NULL DEFAULT 'not_started',
            priority TEXT NOT NULL DEFAULT 'medium',
            responsible_id TEXT,
            project_id TEXT,
            completed_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_responsible ON tasks (responsible_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_deadline ON tasks (deadline);
        ",
    )
    .map_err(|e| TaskPingError::ReadModel(format!("schema init: {e}")))
}
