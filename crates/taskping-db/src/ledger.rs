//! Notification ledger — the durable, append-only record of every sent
//! notification, and the sole authority for reminder deduplication.
//!
//! The dedup key is a partial UNIQUE index on (task_id, kind, window_start):
//! two concurrent passes racing on the same task degrade to a harmless
//! constraint violation instead of a duplicate send.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use taskping_core::{NotificationKind, NotificationRecord, Result, TaskPingError};

use crate::{decode_ts, encode_ts};

/// Result of an append attempt. A `Duplicate` means another attempt for
/// the same (task, kind, window) already committed — treated identically
/// to "already sent", never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    Duplicate,
}

pub struct NotificationLedger {
    conn: Mutex<Connection>,
}

impl NotificationLedger {
    /// Open or create the ledger database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| TaskPingError::Ledger(format!("open {}: {e}", path.display())))?;
        Self::from_connection(conn)
    }

    /// In-memory ledger, for tests and one-off runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| TaskPingError::Ledger(format!("open in-memory: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| TaskPingError::Ledger(format!("busy_timeout: {e}")))?;
        let ledger = Self { conn: Mutex::new(conn) };
        ledger.migrate()?;
        Ok(ledger)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                task_id TEXT,
                kind TEXT NOT NULL,
                message TEXT NOT NULL,
                sent_at TEXT NOT NULL,
                read_at TEXT,
                window_start TEXT
            );

            -- Reminder dedup: at most one record per (task, kind, window).
            CREATE UNIQUE INDEX IF NOT EXISTS idx_notifications_dedup
                ON notifications (task_id, kind, window_start)
                WHERE task_id IS NOT NULL AND window_start IS NOT NULL;

            CREATE INDEX IF NOT EXISTS idx_notifications_task_kind_sent
                ON notifications (task_id, kind, sent_at);
            ",
        )
        .map_err(|e| TaskPingError::Ledger(format!("migration: {e}")))?;
        Ok(())
    }

    /// Whether a record of `kind` exists for `task_id` sent at or after
    /// `since`. The scanner calls this before any delivery attempt.
    pub fn exists(
        &self,
        task_id: &str,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM notifications
                WHERE task_id = ?1 AND kind = ?2 AND sent_at >= ?3
            )",
            rusqlite::params![task_id, kind.as_str(), encode_ts(since)],
            |row| row.get::<_, bool>(0),
        )
        .map_err(|e| TaskPingError::Ledger(format!("exists query: {e}")))
    }

    /// Append a record. A uniqueness violation on the dedup index comes
    /// back as `Duplicate`, anything else as a ledger error.
    pub fn append(&self, record: &NotificationRecord) -> Result<AppendOutcome> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO notifications
                (id, user_id, task_id, kind, message, sent_at, read_at, window_start)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                record.id,
                record.user_id,
                record.task_id,
                record.kind.as_str(),
                record.message,
                encode_ts(record.sent_at),
                record.read_at.map(encode_ts),
                record.window_start.map(encode_ts),
            ],
        );
        match result {
            Ok(_) => Ok(AppendOutcome::Appended),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(AppendOutcome::Duplicate)
            }
            Err(e) => Err(TaskPingError::Ledger(format!("append: {e}"))),
        }
    }

    /// Most recent records, newest first. Observability surface for the
    /// `taskping ledger` command.
    pub fn recent(&self, limit: usize) -> Result<Vec<NotificationRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, task_id, kind, message, sent_at, read_at, window_start
                 FROM notifications ORDER BY sent_at DESC LIMIT ?1",
            )
            .map_err(|e| TaskPingError::Ledger(format!("recent: {e}")))?;

        let raw: Vec<RawRow> = stmt
            .query_map([limit as i64], |row| {
                Ok(RawRow {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    task_id: row.get(2)?,
                    kind: row.get(3)?,
                    message: row.get(4)?,
                    sent_at: row.get(5)?,
                    read_at: row.get(6)?,
                    window_start: row.get(7)?,
                })
            })
            .map_err(|e| TaskPingError::Ledger(format!("recent: {e}")))?
            .collect::<rusqlite::Result<_>>()
            .map_err(|e| TaskPingError::Ledger(format!("recent: {e}")))?;

        raw.into_iter().map(RawRow::into_record).collect()
    }

    /// Total record count.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM notifications", [], |r| {
            r.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(|e| TaskPingError::Ledger(format!("count: {e}")))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TaskPingError::Ledger(format!("connection lock poisoned: {e}")))
    }
}

struct RawRow {
    id: String,
    user_id: String,
    task_id: Option<String>,
    kind: String,
    message: String,
    sent_at: String,
    read_at: Option<String>,
    window_start: Option<String>,
}

impl RawRow {
    fn into_record(self) -> Result<NotificationRecord> {
        Ok(NotificationRecord {
            id: self.id,
            user_id: self.user_id,
            task_id: self.task_id,
            kind: NotificationKind::parse(&self.kind)?,
            message: self.message,
            sent_at: decode_ts(&self.sent_at)?,
            read_at: self.read_at.as_deref().map(decode_ts).transpose()?,
            window_start: self.window_start.as_deref().map(decode_ts).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reminder_record(task_id: &str, sent_at: DateTime<Utc>, window: DateTime<Utc>) -> NotificationRecord {
        NotificationRecord::new("u1", Some(task_id), NotificationKind::Reminder, "ping", sent_at)
            .with_window_start(window)
    }

    #[test]
    fn append_then_exists() {
        let ledger = NotificationLedger::open_in_memory().unwrap();
        let now = Utc::now();
        let window = now - Duration::minutes(10);

        assert!(!ledger.exists("t1", NotificationKind::Reminder, window).unwrap());
        let outcome = ledger.append(&reminder_record("t1", now, window)).unwrap();
        assert_eq!(outcome, AppendOutcome::Appended);
        assert!(ledger.exists("t1", NotificationKind::Reminder, window).unwrap());
    }

    #[test]
    fn duplicate_window_append_is_conflict_not_error() {
        let ledger = NotificationLedger::open_in_memory().unwrap();
        let now = Utc::now();
        let window = now - Duration::minutes(10);

        assert_eq!(
            ledger.append(&reminder_record("t1", now, window)).unwrap(),
            AppendOutcome::Appended
        );
        // Same task + kind + window, fresh record id: the dedup index rejects it.
        assert_eq!(
            ledger.append(&reminder_record("t1", now, window)).unwrap(),
            AppendOutcome::Duplicate
        );
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn different_windows_both_append() {
        let ledger = NotificationLedger::open_in_memory().unwrap();
        let now = Utc::now();
        let w1 = now - Duration::hours(25);
        let w2 = now - Duration::minutes(10);

        assert_eq!(
            ledger.append(&reminder_record("t1", now - Duration::hours(25), w1)).unwrap(),
            AppendOutcome::Appended
        );
        assert_eq!(
            ledger.append(&reminder_record("t1", now, w2)).unwrap(),
            AppendOutcome::Appended
        );
    }

    #[test]
    fn digests_have_no_window_and_never_conflict() {
        let ledger = NotificationLedger::open_in_memory().unwrap();
        let now = Utc::now();
        let daily = |u: &str| {
            NotificationRecord::new(u, None, NotificationKind::DailyDigest, "digest", now)
        };
        assert_eq!(ledger.append(&daily("u1")).unwrap(), AppendOutcome::Appended);
        assert_eq!(ledger.append(&daily("u1")).unwrap(), AppendOutcome::Appended);
    }

    #[test]
    fn exists_respects_since_bound() {
        let ledger = NotificationLedger::open_in_memory().unwrap();
        let now = Utc::now();
        let old_window = now - Duration::hours(48);
        ledger
            .append(&reminder_record("t1", now - Duration::hours(48), old_window))
            .unwrap();

        // A record from a much earlier window does not mask the current one.
        assert!(!ledger
            .exists("t1", NotificationKind::Reminder, now - Duration::hours(1))
            .unwrap());
    }

    #[test]
    fn recent_round_trips_records() {
        let ledger = NotificationLedger::open_in_memory().unwrap();
        let now = Utc::now();
        ledger
            .append(&reminder_record("t1", now, now - Duration::minutes(5)))
            .unwrap();

        let recent = ledger.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].task_id.as_deref(), Some("t1"));
        assert_eq!(recent[0].kind, NotificationKind::Reminder);
    }
}
