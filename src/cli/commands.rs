//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - daemon: start/status for daemon management
//! - run: start a generation run for a goal
//! - runs: list tracked runs
//! - themes: list registry themes
//! - upsert: write a theme directly
//! - identity: owner identity management
//! - watch: tail daemon push events

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// themr - autonomous design-theme generation runs
#[derive(Parser, Debug)]
#[command(name = "themr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Daemon management commands
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },

    /// Start a generation run for a goal
    Run {
        /// Natural-language goal for the generation worker
        goal: String,

        /// Iteration budget for the worker (default 3, clamped)
        #[arg(short, long)]
        iterations: Option<u32>,
    },

    /// List tracked runs
    Runs,

    /// List themes, most recently updated first
    Themes {
        /// Maximum number of themes to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only themes belonging to this owner identity
        #[arg(short, long)]
        owner: Option<String>,
    },

    /// Insert or update a theme directly
    Upsert {
        /// Theme name
        #[arg(short, long)]
        name: String,

        /// Style tokens as inline JSON, e.g. '{"primary": "#1a1a2e"}'
        #[arg(short, long)]
        styles: String,

        /// Existing theme id to overwrite
        #[arg(long)]
        id: Option<String>,

        /// Owner identity id; defaults to the configured agent principal
        #[arg(long)]
        owner: Option<String>,
    },

    /// Owner identity management
    Identity {
        #[command(subcommand)]
        command: IdentityCommands,
    },

    /// Subscribe to daemon events and print them as they arrive
    Watch,
}

/// Daemon management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DaemonCommands {
    /// Start the daemon in the foreground
    Start,

    /// Check whether the daemon is responding
    Status,
}

/// Identity management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum IdentityCommands {
    /// Register a new owner identity
    Add {
        /// Display label for the identity
        name: String,

        /// Fixed identity id (otherwise generated)
        #[arg(long)]
        id: Option<String>,
    },

    /// List registered identities
    List,
}
