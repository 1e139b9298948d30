use anyhow::Result;
use clap::Parser;
use meetscribe::{
    app,
    cli::{handle_logs_command, handle_meetings_command, handle_poll_command, Cli, CliCommand},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("Meetscribe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(CliCommand::Poll) => handle_poll_command(config_path).await,
        Some(CliCommand::Meetings(args)) => handle_meetings_command(config_path, args),
        Some(CliCommand::Logs(args)) => handle_logs_command(config_path, args),
        Some(CliCommand::Serve) | None => app::run_service(config_path).await,
    }
}
