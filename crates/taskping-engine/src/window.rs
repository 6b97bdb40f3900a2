//! Reminder window arithmetic — pure functions, UTC only.
//!
//! A task's window opens `lead_hours` before its deadline and stays open
//! for exactly one hour, matching the hourly scan cadence. A re-run inside
//! the same hour is caught by the ledger; a skipped hour means the
//! reminder is missed, by design.

use chrono::{DateTime, Duration, Utc};

/// Width of the reminder window, in hours. Matches the hourly scan cadence.
pub const WINDOW_HOURS: i64 = 1;

/// When the reminder window for a deadline opens.
pub fn window_start(deadline: DateTime<Utc>, lead_hours: i64) -> DateTime<Utc> {
    deadline - Duration::hours(lead_hours)
}

/// Whether `now` falls inside the half-open window
/// `[window_start, window_start + 1h)`.
pub fn is_due(deadline: DateTime<Utc>, lead_hours: i64, now: DateTime<Utc>) -> bool {
    let start = window_start(deadline, lead_hours);
    start <= now && now < start + Duration::hours(WINDOW_HOURS)
}

/// Whole hours from `now` until the deadline. Negative once overdue.
pub fn hours_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_hours()
}

/// How loudly to announce a reminder, from time remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// One hour or less to the deadline.
    Critical,
    /// A day or less.
    Urgent,
    /// Anything further out.
    Routine,
}

impl Urgency {
    pub fn from_hours_remaining(hours: i64) -> Self {
        if hours <= 1 {
            Self::Critical
        } else if hours <= 24 {
            Self::Urgent
        } else {
            Self::Routine
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            Self::Critical => "🚨 URGENT: deadline imminent",
            Self::Urgent => "⚠️ Urgent: deadline approaching",
            Self::Routine => "⏰ Reminder: upcoming deadline",
        }
    }
}

/// Human phrase for the time left until a deadline.
pub fn remaining_phrase(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = hours_remaining(deadline, now);
    match hours {
        h if h < 1 => "less than an hour".to_string(),
        1 => "1 hour".to_string(),
        h if h < 24 => format!("{h} hours"),
        h if h < 48 => "1 day".to_string(),
        h => format!("{} days", h / 24),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 25, h, m, 0).unwrap()
    }

    #[test]
    fn window_is_half_open_at_both_ends() {
        let deadline = at(12, 0);
        let lead = 2; // window [10:00, 11:00)
        assert!(!is_due(deadline, lead, at(9, 59)));
        assert!(is_due(deadline, lead, at(10, 0))); // start inclusive
        assert!(is_due(deadline, lead, at(10, 59)));
        assert!(!is_due(deadline, lead, at(11, 0))); // end exclusive
    }

    #[test]
    fn deadline_equals_lead_means_due_now() {
        // deadline = now + 24h, lead = 24h → window opens exactly now
        let now = at(10, 0);
        let deadline = now + Duration::hours(24);
        assert!(is_due(deadline, 24, now));
    }

    #[test]
    fn window_already_passed_is_not_due() {
        // deadline = now + 2h, lead = 24h → window closed 21h ago
        let now = at(10, 0);
        let deadline = now + Duration::hours(2);
        assert!(!is_due(deadline, 24, now));
    }

    #[test]
    fn no_retroactive_catch_up_for_past_deadlines() {
        let now = at(10, 0);
        let deadline = now - Duration::hours(5);
        assert!(!is_due(deadline, 1, now));
    }

    #[test]
    fn urgency_tiers() {
        assert_eq!(Urgency::from_hours_remaining(0), Urgency::Critical);
        assert_eq!(Urgency::from_hours_remaining(1), Urgency::Critical);
        assert_eq!(Urgency::from_hours_remaining(2), Urgency::Urgent);
        assert_eq!(Urgency::from_hours_remaining(24), Urgency::Urgent);
        assert_eq!(Urgency::from_hours_remaining(25), Urgency::Routine);
    }

    #[test]
    fn remaining_phrases() {
        let now = at(10, 0);
        assert_eq!(remaining_phrase(now + Duration::minutes(30), now), "less than an hour");
        assert_eq!(remaining_phrase(now + Duration::minutes(90), now), "1 hour");
        assert_eq!(remaining_phrase(now + Duration::hours(5), now), "5 hours");
        assert_eq!(remaining_phrase(now + Duration::hours(30), now), "1 day");
        assert_eq!(remaining_phrase(now + Duration::hours(72), now), "3 days");
    }
}
