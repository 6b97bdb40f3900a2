//! # TaskPing
//!
//! Deadline reminder & digest notification engine.
//!
//! Usage:
//!   taskping run                    # Start the scheduler daemon
//!   taskping scan                   # One reminder pass, report as JSON
//!   taskping digest daily           # One daily digest pass
//!   taskping digest weekly          # One weekly digest pass
//!   taskping ledger --limit 20      # Show recent notification records
//!   taskping init-db                # Create business tables (dev helper)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taskping_channels::TelegramDelivery;
use taskping_core::{DeliveryAdapter, TaskPingConfig, TaskReadModel};
use taskping_db::{schema, NotificationLedger, SqliteReadModel};
use taskping_engine::{DigestAggregator, DigestKind, ReminderScanner, RunReport};
use taskping_scheduler::Scheduler;

#[derive(Parser)]
#[command(name = "taskping", version, about = "⏰ TaskPing — deadline reminders & digests over Telegram")]
struct Cli {
    /// Config file path (default: ~/.taskping/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the scheduler daemon.
    Run,
    /// Run one reminder scan pass now.
    Scan,
    /// Run one digest pass now.
    Digest {
        #[command(subcommand)]
        which: DigestCommand,
    },
    /// Show recent notification ledger records.
    Ledger {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Create the task/user/project tables (development helper).
    InitDb,
}

#[derive(Subcommand)]
enum DigestCommand {
    Daily,
    Weekly,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "taskping=debug" } else { "taskping=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => TaskPingConfig::load_from(path)?,
        None => TaskPingConfig::load()?,
    };
    let db_path = PathBuf::from(&config.database.path);

    if let Command::InitDb = cli.command {
        schema::init_schema(&db_path)?;
        // The ledger migrates its own table on open.
        NotificationLedger::open(&db_path)?;
        println!("✅ Database initialized at {}", db_path.display());
        return Ok(());
    }

    let ledger = Arc::new(NotificationLedger::open(&db_path)?);

    if let Command::Ledger { limit } = cli.command {
        for record in ledger.recent(limit)? {
            println!(
                "{}  {:<14} user={} task={}",
                record.sent_at.format("%Y-%m-%d %H:%M:%S"),
                record.kind.as_str(),
                record.user_id,
                record.task_id.as_deref().unwrap_or("-"),
            );
        }
        return Ok(());
    }

    let read_model: Arc<dyn TaskReadModel> = Arc::new(SqliteReadModel::open(&db_path)?);
    let telegram = TelegramDelivery::new(config.telegram.clone());
    match telegram.get_me().await {
        Ok(me) => tracing::info!("Telegram bot: @{}", me.username.as_deref().unwrap_or("unknown")),
        Err(e) => tracing::warn!("Telegram bot not reachable yet: {e}"),
    }
    let delivery: Arc<dyn DeliveryAdapter> = Arc::new(telegram);

    let scanner = Arc::new(ReminderScanner::new(
        Arc::clone(&read_model),
        Arc::clone(&ledger),
        Arc::clone(&delivery),
        config.engine.clone(),
    ));
    let aggregator = Arc::new(DigestAggregator::new(
        read_model,
        ledger,
        delivery,
        config.engine.clone(),
    ));

    match cli.command {
        Command::Run => {
            let scheduler = Scheduler::new(&config.schedule, scanner, aggregator);
            scheduler.run().await;
            Ok(())
        }
        Command::Scan => {
            let report = scanner.run(Utc::now()).await?;
            print_report(&report)
        }
        Command::Digest { which } => {
            let kind = match which {
                DigestCommand::Daily => DigestKind::Daily,
                DigestCommand::Weekly => DigestKind::Weekly,
            };
            let report = aggregator.run(kind, Utc::now()).await?;
            print_report(&report)
        }
        Command::Ledger { .. } | Command::InitDb => unreachable!("handled above"),
    }
}

fn print_report(report: &RunReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
