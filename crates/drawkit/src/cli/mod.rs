//! Subcommand implementations.

pub mod compress;
pub mod config;
pub mod probe;
