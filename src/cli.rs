//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::directory::DirectoryKind;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// careconnect-stats - user role statistics for the CareConnect admin dashboard
///
/// Fetches every user from a JSON export or a Firestore collection,
/// counts them by role, and writes the dashboard's Total Users figure
/// and User Distribution chart as a Markdown or JSON report.
///
/// Examples:
///   careconnect-stats --input users.json
///   careconnect-stats --input users.json --format json --output dashboard.json
///   careconnect-stats --source firestore --project-id careconnect-prod
///   careconnect-stats --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Where to fetch users from
    ///
    /// Defaults to the config file setting, or `file`.
    #[arg(short, long, value_name = "SOURCE")]
    pub source: Option<DirectoryKind>,

    /// JSON export to read users from (file source)
    ///
    /// Accepts an array of user objects, `{"users": [...]}`,
    /// or a Firestore REST listing with a `documents` array.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Name of the field holding the user's role
    #[arg(long, value_name = "NAME")]
    pub role_field: Option<String>,

    /// Firestore project ID (firestore source)
    #[arg(long, value_name = "ID", env = "CARECONNECT_PROJECT_ID")]
    pub project_id: Option<String>,

    /// Firestore collection holding user documents
    #[arg(long, value_name = "NAME")]
    pub collection: Option<String>,

    /// Firestore REST endpoint (e.g. an emulator at http://localhost:8080)
    #[arg(long, value_name = "URL", env = "FIRESTORE_URL")]
    pub firestore_url: Option<String>,

    /// Bearer token for authenticated Firestore reads
    #[arg(long, value_name = "TOKEN", env = "CARECONNECT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Documents requested per Firestore page
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Leave the distribution legend and pie slices out of the report
    #[arg(long)]
    pub no_chart: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .careconnect.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .careconnect.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    ///
    /// Checks that depend on the config file run later in `Config::validate`.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref url) = self.firestore_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Firestore URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref role_field) = self.role_field {
            if role_field.trim().is_empty() {
                return Err("Role field name cannot be empty".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
