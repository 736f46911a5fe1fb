//! Subcommand implementations.

pub mod apply;
