//! Run reports — the engine's only output surface.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Structured outcome of one scheduled invocation (reminder scan or
/// digest pass). Deterministic given identical inputs and ledger state.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Items evaluated (tasks for a scan, users for a digest).
    pub scanned: usize,
    /// Notifications delivered and recorded.
    pub sent: usize,
    /// Per-item failures (delivery or persistence). Skips are not errors.
    pub errors: usize,
    pub timestamp: DateTime<Utc>,
}

impl RunReport {
    pub fn new(scanned: usize, sent: usize, errors: usize, timestamp: DateTime<Utc>) -> Self {
        Self { scanned, sent, errors, timestamp }
    }
}

/// Outcome of processing one task or user within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemOutcome {
    Sent,
    Skipped,
    Errored,
}

pub(crate) fn tally(outcomes: &[ItemOutcome]) -> (usize, usize) {
    let sent = outcomes.iter().filter(|o| **o == ItemOutcome::Sent).count();
    let errors = outcomes
        .iter()
        .filter(|o| **o == ItemOutcome::Errored)
        .count();
    (sent, errors)
}
