//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::defaults;

/// http-dispatch: templated HTTP requests driven by events or a schedule
///
/// Reads events as JSON lines, sends one HTTP request per event (or per
/// scheduled check), and writes response events as JSON lines to stdout.
#[derive(Debug, Parser)]
#[command(name = "http-dispatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Read events as JSON lines from this file ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,

    /// Seconds between scheduled checks
    #[arg(long)]
    pub interval: Option<u64>,

    /// Run a single scheduled check and exit
    #[arg(long)]
    pub once: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for http-dispatch
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,
    },
    /// Validate the configuration and report every problem
    Check,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }

    /// Returns true if this is the check command.
    #[must_use]
    pub const fn is_check(&self) -> bool {
        matches!(self.command, Some(Command::Check))
    }
}
