//! Command-line handlers

pub mod commands;

pub use commands::{cmd_audit, AuditOptions, CliResult};
