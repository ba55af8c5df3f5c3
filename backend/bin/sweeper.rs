use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Arg, Command};
use lif::constants::SWEEP_INTERVAL_SECS;
use lif::db::{get_db_pool, DatabaseConfig, PgDirectory};
use lif::services::maintenance::{sweep_ended_calls, sweep_unread_messages};
use lif::utils::init_logging;
use tokio::time;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = Command::new("sweeper")
        .about("Delete stale unread messages and old ended calls")
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single sweep and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;
    let directory = PgDirectory::new(pool);

    if matches.get_flag("once") {
        run_sweep(&directory).await;
        return Ok(());
    }

    info!("🧹 Starting sweeper (every {}s)", SWEEP_INTERVAL_SECS);
    let mut interval = time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
    loop {
        interval.tick().await;
        run_sweep(&directory).await;
    }
}

async fn run_sweep(directory: &PgDirectory) {
    let now = Utc::now();

    match sweep_unread_messages(directory, now).await {
        Ok(deleted) => info!("🧹 Deleted {} stale unread messages", deleted),
        Err(e) => error!("❌ Failed to sweep unread messages: {}", e),
    }

    match sweep_ended_calls(directory, now).await {
        Ok(deleted) => info!("🧹 Deleted {} old ended calls", deleted),
        Err(e) => error!("❌ Failed to sweep ended calls: {}", e),
    }
}
