//! Subcommand implementations.

pub mod pin;
pub mod visitors;
