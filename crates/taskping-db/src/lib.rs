//! # TaskPing DB
//! SQLite persistence: the append-only notification ledger (owned by this
//! subsystem) and a read-only view over the task/user tables that the
//! CRUD side of the product maintains.

pub mod ledger;
pub mod read_model;
pub mod schema;

pub use ledger::{AppendOutcome, NotificationLedger};
pub use read_model::SqliteReadModel;

use chrono::{DateTime, SecondsFormat, Utc};
use taskping_core::{Result, TaskPingError};

/// Canonical timestamp encoding for all stored columns. Fixed-width UTC
/// RFC 3339 with millisecond precision, so lexicographic order matches
/// chronological order in SQL comparisons.
pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn decode_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| TaskPingError::Data(format!("bad stored timestamp {s:?}: {e}")))
}
