//! API route modules.

pub mod automations;
pub mod calendar;
pub mod connections;
pub mod cron;
pub mod generate;
pub mod logs;
pub mod meetings;
pub mod posts;
pub mod settings;
