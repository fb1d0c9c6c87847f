//! Subcommand implementations.

pub mod analyze;
pub mod clean;
pub mod config;
pub mod process;
pub mod storage;
