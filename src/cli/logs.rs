//! CLI handler for viewing the polling log.
//!
//! This module handles terminal presentation.
//! Records come straight from the `cron_logs` table.

use crate::config::Config;
use crate::db::cron_logs::CronLogRepository;
use crate::db::Database;
use anyhow::Result;
use std::path::Path;

use super::args::LogsCliArgs;

pub fn handle_logs_command(config_path: Option<&Path>, args: LogsCliArgs) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database_path()?)?;
    let logs = db.with_conn(|conn| CronLogRepository::list(conn, args.lines))?;

    println!("=== Polling Sweeps (last {} entries) ===\n", args.lines);

    if logs.is_empty() {
        println!("No sweeps recorded yet.");
        return Ok(());
    }

    for entry in &logs {
        println!("[{}] {} | {}", entry.id, entry.created_at, entry.message);
    }

    Ok(())
}
