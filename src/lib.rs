pub mod api;
pub mod app;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod db;
pub mod generation;
pub mod global;
pub mod meeting;
pub mod normalizer;
pub mod recall;
pub mod reconcile;
pub mod scheduler;
pub mod social;
