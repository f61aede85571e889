//! Command handlers for the CLI
//!
//! Each handler takes its parsed arguments plus the loaded [`AppConfig`],
//! performs the requested operation and prints a human-readable summary.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::app::{
    read_status, DatabaseConfig, EncodingNormalizer, PgLoader, Pipeline, RegistryClient, Target,
    ZipExpander,
};
use crate::cli::args::{ConfigAction, ConfigArgs, RunArgs, TargetArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the run command
pub async fn handle_run(args: RunArgs, config: AppConfig) -> Result<()> {
    config.validate()?;
    let target = resolve_target(&args.target)?;

    let (mut pipeline_config, client_config, mut database_config) = config.to_runtime_config();
    if args.keep_workspace {
        pipeline_config.clean_workspace = false;
    }
    pipeline_config.validate().map_err(AppError::generic)?;
    ensure_password(&mut database_config)?;

    info!(
        "Processing {} into {}",
        target,
        database_config.display_target()
    );

    let client = RegistryClient::with_config(client_config)?;
    let loader = PgLoader::new(&database_config);
    let pipeline = Pipeline::new(
        pipeline_config,
        Arc::new(client),
        Arc::new(ZipExpander),
        Arc::new(EncodingNormalizer::default()),
        Arc::new(loader),
    );

    println!("🚀 Processing CNPJ snapshot {}", target);
    let started = Instant::now();
    let report = pipeline.run(&target).await?;

    println!();
    print!("{}", report);
    println!();
    if report.is_complete() {
        println!("✅ All files loaded");
    } else {
        println!(
            "⚠️  {} file(s) still outstanding; run again to resume",
            report.outstanding.len()
        );
    }
    println!("⏱️  Finished in {:.1?}", started.elapsed());

    Ok(())
}

/// Handle the status command
pub async fn handle_status(args: TargetArgs, config: AppConfig) -> Result<()> {
    let target = resolve_target(&args)?;

    match read_status(&config.paths.destination_root, &target).await? {
        Some(report) => print!("{}", report),
        None => {
            println!("No manifest found for {}", target);
            println!(
                "   Expected at: {}",
                target
                    .manifest_path(&config.paths.destination_root)
                    .display()
            );
        }
    }

    Ok(())
}

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    config: AppConfig,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => {
            let path = match config_override {
                Some(path) => path,
                None => AppConfig::get_default_config_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists: {}", path.display());
                println!("Use --force to overwrite it.");
                return Ok(());
            }

            AppConfig::write_default_config(&path).await?;
            println!("📁 Wrote default configuration file:");
            println!("   {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", AppConfig::get_default_config_path()?.display());
        }
    }

    Ok(())
}

/// Build the target from arguments, prompting for whatever is missing
fn resolve_target(args: &TargetArgs) -> Result<Target> {
    let year = match &args.year {
        Some(year) => year.clone(),
        None => prompt("Year of the snapshot (e.g. 2025): ")?,
    };
    let month = match &args.month {
        Some(month) => month.clone(),
        None => prompt("Month of the snapshot (1-12): ")?,
    };

    Ok(Target::parse(&year, &month)?)
}

/// Read one trimmed line from stdin after printing `label`
fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(AppError::generic("No input available on stdin"));
    }

    Ok(input.trim().to_string())
}

/// Ask for the database password when none is configured and a terminal is attached
fn ensure_password(database: &mut DatabaseConfig) -> Result<()> {
    if database.password.is_some() {
        return Ok(());
    }

    if !atty::is(atty::Stream::Stdin) {
        warn!("No database password configured; connecting without one");
        return Ok(());
    }

    let password = rpassword::prompt_password(format!(
        "Password for {}@{}: ",
        database.user,
        database.display_target()
    ))?;
    if !password.is_empty() {
        database.password = Some(password);
    }

    Ok(())
}
