pub mod blocklist;
pub mod common;
pub mod config;
pub mod mode;
pub mod schedule;
pub mod settings;
pub mod stats;
pub mod tick;
