//! TaskPing configuration system.
//!
//! Everything the engine needs at runtime — cadences, the default reminder
//! lead time, delivery limits — is carried here explicitly and passed in at
//! construction. The engine never reads ambient process state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TaskPingError};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPingConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for TaskPingConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            telegram: TelegramConfig::default(),
            schedule: ScheduleConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl TaskPingConfig {
    /// Load config from the default path (~/.taskping/config.toml),
    /// falling back to defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TaskPingError::Config(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| TaskPingError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| TaskPingError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the TaskPing home directory (~/.taskping).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".taskping")
    }
}

/// SQLite storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file holding tasks, users, projects, and the
    /// notification ledger.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    TaskPingConfig::home_dir()
        .join("taskping.db")
        .to_string_lossy()
        .into_owned()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

/// Telegram Bot API delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

fn default_send_timeout() -> u64 {
    10
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            send_timeout_secs: default_send_timeout(),
        }
    }
}

/// Cron cadences for the scheduled passes. 5-field expressions
/// (MIN HOUR DOM MON DOW), evaluated in UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Reminder scan — hourly at the top of the hour.
    #[serde(default = "default_reminder_cron")]
    pub reminder_cron: String,
    /// Daily digest — 08:00 every day.
    #[serde(default = "default_daily_cron")]
    pub daily_digest_cron: String,
    /// Weekly digest — Monday 09:00.
    #[serde(default = "default_weekly_cron")]
    pub weekly_digest_cron: String,
    /// How often the scheduler loop wakes to check for due jobs.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

fn default_reminder_cron() -> String {
    "0 * * * *".into()
}
fn default_daily_cron() -> String {
    "0 8 * * *".into()
}
fn default_weekly_cron() -> String {
    "0 9 * * 1".into()
}
fn default_tick_secs() -> u64 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            reminder_cron: default_reminder_cron(),
            daily_digest_cron: default_daily_cron(),
            weekly_digest_cron: default_weekly_cron(),
            tick_secs: default_tick_secs(),
        }
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Lead time applied when a task has no explicit reminder lead.
    #[serde(default = "default_lead_hours")]
    pub default_lead_hours: i64,
    /// Bound on concurrent deliveries within one pass.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_sends: usize,
    /// Tasks shown in the daily digest before the overflow note.
    #[serde(default = "default_daily_cap")]
    pub daily_digest_task_cap: usize,
    /// Tasks shown in the weekly digest before the overflow note.
    #[serde(default = "default_weekly_cap")]
    pub weekly_digest_task_cap: usize,
}

fn default_lead_hours() -> i64 {
    24
}
fn default_max_concurrent() -> usize {
    4
}
fn default_daily_cap() -> usize {
    5
}
fn default_weekly_cap() -> usize {
    7
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_lead_hours: default_lead_hours(),
            max_concurrent_sends: default_max_concurrent(),
            daily_digest_task_cap: default_daily_cap(),
            weekly_digest_task_cap: default_weekly_cap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = TaskPingConfig::default();
        assert_eq!(cfg.engine.default_lead_hours, 24);
        assert_eq!(cfg.schedule.reminder_cron, "0 * * * *");
        assert_eq!(cfg.telegram.send_timeout_secs, 10);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: TaskPingConfig = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.telegram.bot_token, "123:abc");
        assert_eq!(cfg.engine.max_concurrent_sends, 4);
        assert_eq!(cfg.schedule.weekly_digest_cron, "0 9 * * 1");
    }
}
