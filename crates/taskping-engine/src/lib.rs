//! # TaskPing Engine
//!
//! The reminder & digest notification engine. Decides exactly which
//! notifications are due exactly once, delivers them, and records what
//! was sent so re-runs never duplicate.
//!
//! ## Flow
//! ```text
//! Scheduler tick
//!   ├── ReminderScanner: eligible tasks → window check → ledger dedup
//!   │     → resolve user → render → deliver → record
//!   └── DigestAggregator: linked users → stats → render
//!         → deliver → record (per user, independent)
//! ```
//! The ledger is the commit point: a successful append marks a reminder
//! window as handled; a uniqueness conflict means another pass got there
//! first.

pub mod digest;
pub mod events;
pub mod render;
pub mod report;
pub mod scanner;
pub mod window;

#[cfg(test)]
pub(crate) mod testutil;

pub use digest::{DigestAggregator, DigestKind};
pub use events::EventNotifier;
pub use report::RunReport;
pub use scanner::ReminderScanner;
