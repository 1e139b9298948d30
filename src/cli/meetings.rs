//! CLI handlers for meeting inspection and one-off sweeps.

use crate::app;
use crate::config::Config;
use crate::db::meetings::MeetingRepository;
use crate::db::Database;
use crate::meeting::MeetingStatus;
use anyhow::Result;
use std::path::Path;

use super::args::MeetingsCliArgs;

pub fn handle_meetings_command(config_path: Option<&Path>, args: MeetingsCliArgs) -> Result<()> {
    let status = args
        .status
        .as_deref()
        .map(|s| MeetingStatus::parse(&s.to_uppercase()))
        .transpose()?;

    let config = Config::load(config_path)?;
    let db = Database::open(&config.database_path()?)?;
    let meetings = db.with_conn(|conn| MeetingRepository::list(conn, status, args.limit))?;

    if meetings.is_empty() {
        println!("No meetings found.");
        return Ok(());
    }

    println!("Found {} meeting(s):\n", meetings.len());

    for meeting in meetings {
        println!("ID: {}", meeting.id);
        println!("Title: {}", meeting.title);
        println!("Start: {}", meeting.start_time.to_rfc3339());
        println!("Status: {}", meeting.status);
        println!(
            "Bot: {}",
            meeting.recall_bot_id.as_deref().unwrap_or("(none)")
        );
        if !meeting.recording_enabled {
            println!("Recording: disabled");
        }
        println!("---");
    }

    Ok(())
}

pub async fn handle_poll_command(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let (_db, reconciler, _bots) = app::build_reconciler(&config)?;

    let report = reconciler.sweep().await?;

    println!("Sweep finished: {}", report.summary());
    for t in &report.transitions {
        println!("  {}  {} -> {}", t.meeting_id, t.from, t.to);
    }

    Ok(())
}
