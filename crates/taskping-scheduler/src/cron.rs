//! Lightweight cron expression parser.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds)
//! Wildcards: *, */N, N, comma lists. Minute, hour, and day-of-week are
//! matched; day-of-month and month accept only "*" semantics.
//!
//! Enough for the three cadences this system runs — hourly scans, a daily
//! digest time, and a weekly digest day/time — without a cron crate.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

/// Parse a cron expression and compute the next run time after `after`.
/// All evaluation is in UTC.
pub fn next_run_from_cron(expression: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = expression.split_whitespace().collect();
    if parts.len() != 5 {
        tracing::warn!(
            "invalid cron expression: '{}' (need 5 fields: MIN HOUR DOM MON DOW)",
            expression
        );
        return None;
    }

    let minutes = parse_field(parts[0], 0, 59)?;
    let hours = parse_field(parts[1], 0, 23)?;
    let _dom = parts[2]; // day of month: only * supported
    let _mon = parts[3]; // month: only * supported
    let weekdays = parse_dow_field(parts[4])?;

    // Find next matching minute after `after`, scanning up to 8 days so a
    // weekly day-of-week constraint is always reachable.
    let mut candidate = (after + Duration::minutes(1))
        .with_second(0)
        .and_then(|c| c.with_nanosecond(0))
        .unwrap_or(after);

    for _ in 0..(8 * 24 * 60) {
        if minutes.contains(&candidate.minute())
            && hours.contains(&candidate.hour())
            && weekdays.contains(&candidate.weekday().num_days_from_sunday())
        {
            return Some(candidate);
        }
        candidate += Duration::minutes(1);
    }

    None
}

/// Parse a cron field into the list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    if field == "*" {
        return Some((min..=max).collect());
    }

    // */N — every N
    if let Some(step) = field.strip_prefix("*/") {
        let n: u32 = step.parse().ok()?;
        if n == 0 {
            return None;
        }
        return Some((min..=max).step_by(n as usize).collect());
    }

    // Comma-separated: "0,15,30,45"
    if field.contains(',') {
        let vals: Result<Vec<u32>, _> = field.split(',').map(|s| s.trim().parse()).collect();
        return vals
            .ok()
            .map(|v| v.into_iter().filter(|x| *x >= min && *x <= max).collect());
    }

    let n: u32 = field.parse().ok()?;
    if n >= min && n <= max {
        Some(vec![n])
    } else {
        None
    }
}

/// Day-of-week field: 0-7 where both 0 and 7 mean Sunday.
fn parse_dow_field(field: &str) -> Option<Vec<u32>> {
    let vals = parse_field(field, 0, 7)?;
    let mut normalized: Vec<u32> = vals.into_iter().map(|d| d % 7).collect();
    normalized.sort_unstable();
    normalized.dedup();
    Some(normalized)
}
