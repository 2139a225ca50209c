//! CLI module for themr - command-line interface and subcommands.
//!
//! Provides the entry point with subcommands for daemon management, run
//! launch, theme listing, and identity plumbing.

pub mod commands;

pub use commands::{Cli, Commands, DaemonCommands, IdentityCommands};
