//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Host to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Report file name, e.g. `2024-01-01_Alice.json`
    pub filename: String,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Save command arguments.
#[derive(Debug, Args)]
pub struct SaveCommand {
    /// JSON file holding the form fields, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl SaveCommand {
    /// Whether the record should be read from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
