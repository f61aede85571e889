//! Command-line interface components
//!
//! This module contains CLI-specific code for the CNPJ ETL application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, RunArgs, TargetArgs};
pub use commands::{handle_config, handle_run, handle_status};
