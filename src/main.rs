//! CNPJ ETL CLI application
//!
//! Command-line interface for loading the Receita Federal CNPJ open-data
//! snapshot into PostgreSQL. Runs are resumable: progress is kept in a
//! per-snapshot manifest.

use std::process;

use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use cnpj_etl::cli::{handle_config, handle_run, handle_status, Cli, Commands};
use cnpj_etl::config::{AppConfig, LoggingConfig};
use cnpj_etl::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Write a default config on first use unless one was given explicitly
    let first_run = if cli.global.config.is_none() && !matches!(cli.command, Commands::Config(_))
    {
        AppConfig::initialize_first_run().await.err()
    } else {
        None
    };

    let config = AppConfig::load(cli.global.config.clone()).await?;
    init_logging(&cli, &config.logging);

    if let Some(e) = first_run {
        warn!("Could not create default configuration file: {}", e);
    }

    info!("CNPJ ETL v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run(args) => {
            info!("Executing run command");
            handle_run(args, config).await
        }
        Commands::Status(args) => {
            info!("Executing status command");
            handle_status(args, config).await
        }
        Commands::Config(args) => handle_config(args, config, cli.global.config).await,
    }
}

/// Initialize logging from the CLI verbosity flags, falling back to the configured level
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = match cli.log_level() {
        Some(level) => level.to_string().to_lowercase(),
        None => logging.level.clone(),
    };

    let mut filter = EnvFilter::from_default_env();
    match format!("cnpj_etl={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(_) => eprintln!("Ignoring invalid log level: {}", level),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
