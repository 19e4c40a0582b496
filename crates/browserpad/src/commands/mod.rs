//! Subcommand implementations.

pub mod check_path;
pub mod serve;
