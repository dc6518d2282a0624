//! Command-line interface for tdreport.
//!
//! This module provides the CLI structure for the `tdreport` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, ExportCommand, ListCommand, SaveCommand, ServeCommand};

/// tdreport - Technical Director shift report server
///
/// Serves the shift report form, stores each submission as a JSON file and
/// lets you list or export stored reports.
#[derive(Debug, Parser)]
#[command(name = "tdreport")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// List stored reports
    List(ListCommand),

    /// Write a stored report to stdout or a file
    Export(ExportCommand),

    /// Store a report from a JSON file
    Save(SaveCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
