//! Command-line argument parsing for the CNPJ ETL
//!
//! This module defines the CLI structure using clap derive macros: running
//! the pipeline for one snapshot, inspecting a snapshot's manifest and
//! managing the configuration file.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// CNPJ ETL - Load the CNPJ open-data snapshot into PostgreSQL
#[derive(Parser, Debug)]
#[command(
    name = "cnpj_etl",
    version,
    about = "Download, validate and load the monthly CNPJ open-data snapshot",
    long_about = "A resumable ETL for the Receita Federal CNPJ open data.
Each run plans the snapshot from the published listing, downloads and extracts the archives,
re-encodes every file as UTF-8 with line-count validation, and bulk loads it into PostgreSQL.
Progress is kept in a manifest so an interrupted run resumes where it stopped."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run (or resume) the pipeline for one monthly snapshot
    Run(RunArgs),

    /// Show the progress report of a snapshot without running anything
    Status(TargetArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Snapshot selection; missing values are prompted for
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Year of the snapshot (e.g. 2025)
    #[arg(short, long)]
    pub year: Option<String>,

    /// Month of the snapshot (1-12)
    #[arg(short, long)]
    pub month: Option<String>,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Keep downloads and extracted files between runs
    #[arg(long)]
    pub keep_workspace: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration (password omitted)
    Show,

    /// Print the default configuration file location
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level requested by the global flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}
