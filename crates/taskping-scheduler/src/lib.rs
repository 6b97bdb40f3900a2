//! # TaskPing Scheduler
//! Cron cadences and the tokio loop that triggers reminder scans and
//! digest passes. Guarantees at-least-once invocation per slot; the
//! ledger makes duplicate reminder invocations harmless.

pub mod cron;
pub mod run;

pub use run::{JobKind, Scheduler};
