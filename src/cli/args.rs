use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meetscribe")]
#[command(about = "Meeting recorder and follow-up assistant", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: ~/.config/meetscribe/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the API server and background poller (default)
    Serve,
    /// Run a single polling sweep and exit
    Poll,
    /// List meetings known to the recorder
    Meetings(MeetingsCliArgs),
    /// Show recent polling sweep records
    Logs(LogsCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct MeetingsCliArgs {
    /// Only meetings in this status (SCHEDULED, PROCESSING, TRANSCRIBING, COMPLETED, FAILED)
    #[arg(short, long)]
    pub status: Option<String>,
    /// Maximum number of meetings to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

#[derive(ClapArgs, Debug)]
pub struct LogsCliArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value = "100")]
    pub lines: usize,
}
