//! TaskPulse: a personal productivity backend.
//!
//! Users own tasks, notes, urgent events and health records stored in SQLite.
//! [`services::task_analytics`] summarizes task collections; the dashboard and
//! analysis services wrap it with storage access, and [`commands`] exposes
//! every operation as an async call returning a serializable response.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
