//! Message rendering — HTML bodies for Telegram `parse_mode: HTML`.
//!
//! Formatting is a presentation concern: deadlines are shown in UTC, the
//! canonical zone all window arithmetic runs in.

use chrono::{DateTime, Utc};

use taskping_core::types::{Priority, Task, TaskStatus};
use taskping_core::User;

use crate::digest::{DailyStats, WeeklyStats};
use crate::window::{self, Urgency};

const DESCRIPTION_LIMIT: usize = 200;
const NO_PROJECT: &str = "No project";

/// Truncate to `limit` characters, appending an ellipsis marker when cut.
/// Counts chars, not bytes, so multi-byte text never splits mid-character.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...")
    }
}

fn fmt_deadline(ts: DateTime<Utc>) -> String {
    ts.format("%d/%m/%Y %H:%M UTC").to_string()
}

/// Deadline reminder body.
pub fn reminder_message(task: &Task, project_name: Option<&str>, now: DateTime<Utc>) -> String {
    // Scanner guarantees a deadline; fall back to now rather than panic.
    let deadline = task.deadline.unwrap_or(now);
    let urgency = Urgency::from_hours_remaining(window::hours_remaining(deadline, now));

    let mut message = format!(
        "{}\n\n{} <b>{}</b>\n\n\
         📁 Project: {}\n\
         📊 Priority: {}\n\
         📅 Deadline: {}\n\
         ⏳ Time remaining: <b>{}</b>\n",
        urgency.header(),
        task.priority.emoji(),
        task.title,
        project_name.unwrap_or(NO_PROJECT),
        priority_label(task.priority),
        fmt_deadline(deadline),
        window::remaining_phrase(deadline, now),
    );

    message.push_str(&format!("\nCurrent status: {}\n", task.status.label()));

    if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
        message.push_str(&format!("\n📝 {}\n", truncate(desc, DESCRIPTION_LIMIT)));
    }

    message
}

/// Daily digest body.
pub fn daily_digest_message(user: &User, stats: &DailyStats, now: DateTime<Utc>, cap: usize) -> String {
    let mut message = format!(
        "🌅 <b>Good morning, {}!</b>\n\n📋 <b>Daily summary</b> — {}\n\n",
        user.full_name,
        now.format("%d/%m/%Y"),
    );

    message.push_str("📊 <b>Your tasks:</b>\n");
    message.push_str(&format!("• Not started: {}\n", stats.not_started));
    message.push_str(&format!("• In progress: {}\n", stats.in_progress));
    if stats.overdue > 0 {
        message.push_str(&format!("• ⚠️ Overdue: {}\n", stats.overdue));
    }
    message.push('\n');

    if stats.due_today.is_empty() {
        message.push_str("✅ <b>Nothing due today.</b>\n");
    } else {
        message.push_str(&format!(
            "⏰ <b>Due today ({}):</b>\n\n",
            stats.due_today.len()
        ));
        for task in stats.due_today.iter().take(cap) {
            let time = task
                .deadline
                .map(|d| d.format("%H:%M").to_string())
                .unwrap_or_default();
            message.push_str(&format!(
                "{} <b>{}</b>\n   🕐 {}\n",
                task.priority.emoji(),
                task.title,
                time,
            ));
        }
        if stats.due_today.len() > cap {
            message.push_str(&format!(
                "\n... and {} more task(s)\n",
                stats.due_today.len() - cap
            ));
        }
    }

    message
}

/// Weekly digest body.
pub fn weekly_digest_message(user: &User, stats: &WeeklyStats, cap: usize) -> String {
    let mut message = format!("📈 <b>Weekly summary</b>\n\nHi {},\n\n", user.full_name);

    message.push_str(&format!(
        "📅 <b>Last week:</b>\n✅ You completed {} task(s)\n\n",
        stats.completed_last_week
    ));

    if stats.due_this_week.is_empty() {
        message.push_str("✅ <b>Nothing scheduled for this week.</b>\n");
    } else {
        message.push_str(&format!(
            "📋 <b>This week ({} tasks):</b>\n\n",
            stats.due_this_week.len()
        ));
        for task in stats.due_this_week.iter().take(cap) {
            let day = task
                .deadline
                .map(|d| d.format("%A %d/%m").to_string())
                .unwrap_or_else(|| "No date".to_string());
            message.push_str(&format!(
                "{} <b>{}</b>\n   📅 {}\n",
                task.priority.emoji(),
                task.title,
                day,
            ));
        }
        if stats.due_this_week.len() > cap {
            message.push_str(&format!(
                "\n... and {} more task(s)\n",
                stats.due_this_week.len() - cap
            ));
        }
    }

    message.push_str(&format!(
        "\n📊 <b>Overall:</b>\n• Assigned: {}\n• Completed: {} ({:.1}%)\n",
        stats.total_assigned,
        stats.total_completed,
        stats.completion_rate(),
    ));
    if stats.overdue > 0 {
        message.push_str(&format!("• ⚠️ Overdue: {}\n", stats.overdue));
    }

    message
}

/// New-task assignment notice.
pub fn new_task_message(
    task: &Task,
    project_name: Option<&str>,
    creator_name: &str,
) -> String {
    let deadline = task
        .deadline
        .map(fmt_deadline)
        .unwrap_or_else(|| "No deadline".to_string());

    let mut message = format!(
        "📋 <b>New task assigned</b>\n\n{} <b>{}</b>\n\n\
         📁 Project: {}\n\
         👤 Assigned by: {}\n\
         📅 Deadline: {}\n",
        task.priority.emoji(),
        task.title,
        project_name.unwrap_or(NO_PROJECT),
        creator_name,
        deadline,
    );

    if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
        message.push_str(&format!("\n📝 {}\n", truncate(desc, DESCRIPTION_LIMIT)));
    }

    message
}

/// Status-change notice.
pub fn status_change_message(
    task: &Task,
    project_name: Option<&str>,
    old_status: TaskStatus,
    new_status: TaskStatus,
    changed_by: &str,
) -> String {
    format!(
        "🔄 <b>Status changed</b>\n\n<b>{}</b>\n📁 Project: {}\n\n\
         {} → {}\n\n👤 Updated by: {}\n",
        task.title,
        project_name.unwrap_or(NO_PROJECT),
        old_status.label(),
        new_status.label(),
        changed_by,
    )
}

/// Task-completed notice.
pub fn completed_message(task: &Task, project_name: Option<&str>, completed_by: &str) -> String {
    let when = task
        .completed_at
        .map(fmt_deadline)
        .unwrap_or_else(|| "just now".to_string());
    format!(
        "✅ <b>Task completed</b>\n\n<b>{}</b>\n📁 Project: {}\n\n\
         👤 Completed by: {}\n⏱️ Completed: {}\n",
        task.title,
        project_name.unwrap_or(NO_PROJECT),
        completed_by,
        when,
    )
}

fn priority_label(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use taskping_core::types::{Priority, TaskStatus};

    fn sample_task(description: Option<String>) -> Task {
        Task {
            id: "t1".into(),
            title: "Ship the release".into(),
            description,
            deadline: Some(Utc.with_ymd_and_hms(2026, 8, 26, 10, 0, 0).unwrap()),
            reminder_lead_hours: Some(24),
            status: TaskStatus::InProgress,
            priority: Priority::High,
            responsible_id: Some("u1".into()),
            project_id: Some("p1".into()),
            completed_at: None,
        }
    }

    #[test]
    fn truncation_is_char_safe_and_marked() {
        let long = "é".repeat(250);
        let out = truncate(&long, 200);
        assert_eq!(out.chars().count(), 203); // 200 + "..."
        assert!(out.ends_with("..."));

        let short = "fits";
        assert_eq!(truncate(short, 200), "fits");
    }

    #[test]
    fn reminder_contains_required_fields() {
        let task = sample_task(Some("x".repeat(300)));
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        let msg = reminder_message(&task, Some("Engine"), now);

        assert!(msg.contains("Ship the release"));
        assert!(msg.contains("Engine"));
        assert!(msg.contains("High"));
        assert!(msg.contains("26/08/2026 10:00 UTC"));
        assert!(msg.contains("1 day"));
        assert!(msg.contains("..."));
        // 24h out → urgent tier, not critical
        assert!(msg.contains("⚠️"));
    }

    #[test]
    fn reminder_critical_within_one_hour() {
        let mut task = sample_task(None);
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
        task.deadline = Some(now + Duration::minutes(30));
        let msg = reminder_message(&task, None, now);
        assert!(msg.contains("🚨"));
        assert!(msg.contains("less than an hour"));
        assert!(msg.contains(NO_PROJECT));
    }

    #[test]
    fn daily_digest_reports_counts_and_overflow() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 8, 0, 0).unwrap();
        let user = User {
            id: "u1".into(),
            full_name: "Ada".into(),
            telegram_chat_id: Some(1),
            active: true,
            role: "member".into(),
        };
        let mut due_today = Vec::new();
        for i in 0..6 {
            let mut t = sample_task(None);
            t.id = format!("t{i}");
            t.deadline = Some(now + Duration::hours(i));
            due_today.push(t);
        }
        let stats = DailyStats {
            due_today,
            not_started: 2,
            in_progress: 3,
            overdue: 1,
        };
        let msg = daily_digest_message(&user, &stats, now, 5);
        assert!(msg.contains("Due today (6)"));
        assert!(msg.contains("Overdue: 1"));
        assert!(msg.contains("and 1 more task(s)"));
    }

    #[test]
    fn weekly_digest_formats_completion_rate() {
        let user = User {
            id: "u1".into(),
            full_name: "Ada".into(),
            telegram_chat_id: Some(1),
            active: true,
            role: "member".into(),
        };
        let stats = WeeklyStats {
            completed_last_week: 3,
            due_this_week: Vec::new(),
            overdue: 0,
            total_assigned: 10,
            total_completed: 3,
        };
        let msg = weekly_digest_message(&user, &stats, 7);
        assert!(msg.contains("(30.0%)"));
        assert!(msg.contains("You completed 3 task(s)"));
    }
}
