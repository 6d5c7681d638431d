//! careconnect-stats - CareConnect admin dashboard statistics
//!
//! Fetches the user directory, counts users by role, and writes the
//! Total Users figure and User Distribution chart as a report.
//!
//! Exit codes:
//!   0 - Success (an empty user directory is still a success)
//!   1 - Any error (invalid arguments, config, fetch failure, write failure)

mod analysis;
mod cli;
mod config;
mod directory;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use models::{Category, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where the effective configuration came from.
#[derive(Debug)]
enum ConfigOrigin {
    Explicit(PathBuf),
    WorkingDir,
    BuiltIn,
    /// The default file exists but could not be loaded.
    Fallback(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(effective_log_level(&args, &config));

    info!("careconnect-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    report_config_origin(&origin);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match run(config, args.quiet).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Dashboard generation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .careconnect.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to choose the user source, role field, and report format.");
    Ok(())
}

/// Pick the log level from CLI flags, then the config file.
fn effective_log_level(args: &Args, config: &Config) -> tracing::Level {
    if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Initialize logging. `RUST_LOG` overrides the computed level.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::WorkingDir)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Fallback(format!("{:#}", e)))),
    }
}

fn report_config_origin(origin: &ConfigOrigin) {
    match origin {
        ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
        ConfigOrigin::WorkingDir => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
        ConfigOrigin::BuiltIn => debug!("No config file found, using defaults"),
        ConfigOrigin::Fallback(reason) => {
            warn!("Failed to load config: {}; using defaults", reason)
        }
    }
}

/// Fetch, aggregate, and write the dashboard report.
async fn run(config: Config, quiet: bool) -> Result<()> {
    // Step 1: Fetch the user snapshot
    let user_directory = directory::from_config(&config.directory)?;
    let source = user_directory.describe();

    if !quiet {
        println!("📥 Fetching users from {}", source);
    }

    let start_time = Instant::now();
    let records = user_directory
        .fetch_users()
        .await
        .with_context(|| format!("Failed to fetch users from {}", source))?;
    let fetch_seconds = start_time.elapsed().as_secs_f64();

    if records.is_empty() {
        warn!("User directory {} returned no users", source);
    }

    // Step 2: Aggregate by role
    let (tally, distribution) = analysis::aggregate(&records);
    debug!("Tally: {:?}", tally);

    let unclassified = tally.count(Category::Other);
    if unclassified > 0 {
        warn!(
            "{} of {} users have no recognized role and are left out of the distribution",
            unclassified,
            tally.total()
        );
    }

    // Step 3: Build and write the report
    let metadata = ReportMetadata {
        source,
        generated_at: Utc::now(),
        fetch_seconds,
    };
    let dashboard = report::build_report(tally, distribution, metadata, &config.report);

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&dashboard, config.report.include_counts)
        }
    };

    report::save_report(&output, &config.general.output)?;
    info!("Report written to {}", config.general.output.display());

    if !quiet {
        println!("\n📊 User Summary:");
        println!("   Total users: {}", dashboard.tally.total());
        println!(
            "   Classified: {} | Unclassified: {}",
            dashboard.tally.classified_total(),
            unclassified
        );
        println!("   {}", report::summary_line(&dashboard.distribution));
        println!(
            "\n✅ Dashboard report saved to: {}",
            config.general.output.display()
        );
    }

    Ok(())
}
