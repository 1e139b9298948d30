pub mod args;
mod logs;
mod meetings;

pub use args::{Cli, CliCommand, LogsCliArgs, MeetingsCliArgs};
pub use logs::handle_logs_command;
pub use meetings::{handle_meetings_command, handle_poll_command};
