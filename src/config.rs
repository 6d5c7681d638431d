//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.careconnect.toml` files.

use crate::cli::OutputFormat;
use crate::directory::DirectoryKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".careconnect.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// User directory settings.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("user_dashboard.md")
}

/// Where and how to fetch users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory implementation.
    #[serde(default)]
    pub source: DirectoryKind,

    /// JSON export path (file source).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,

    /// Name of the field holding the user's role.
    #[serde(default = "default_role_field")]
    pub role_field: String,

    /// Firestore project ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Firestore collection holding user documents.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Firestore REST endpoint.
    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,

    /// Bearer token for authenticated reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Documents requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Show a spinner while fetching.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            source: DirectoryKind::default(),
            input: None,
            role_field: default_role_field(),
            project_id: None,
            collection: default_collection(),
            firestore_url: default_firestore_url(),
            token: None,
            page_size: default_page_size(),
            timeout_seconds: default_timeout(),
            show_progress: true,
        }
    }
}

fn default_role_field() -> String {
    "role".to_string()
}

fn default_collection() -> String {
    "users".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_page_size() -> u32 {
    300
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Report heading.
    #[serde(default = "default_title")]
    pub title: String,

    /// Include the distribution legend and pie slices.
    #[serde(default = "default_true")]
    pub include_chart: bool,

    /// Include the per-role count table.
    #[serde(default = "default_true")]
    pub include_counts: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            title: default_title(),
            include_chart: true,
            include_counts: true,
        }
    }
}

fn default_title() -> String {
    "CareConnect Admin Dashboard".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.careconnect.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values the user actually passed override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(source) = args.source {
            self.directory.source = source;
        }
        if let Some(ref input) = args.input {
            self.directory.input = Some(input.clone());
        }
        if let Some(ref role_field) = args.role_field {
            self.directory.role_field = role_field.clone();
        }
        if let Some(ref project_id) = args.project_id {
            self.directory.project_id = Some(project_id.clone());
        }
        if let Some(ref collection) = args.collection {
            self.directory.collection = collection.clone();
        }
        if let Some(ref url) = args.firestore_url {
            self.directory.firestore_url = url.clone();
        }
        if let Some(ref token) = args.token {
            self.directory.token = Some(token.clone());
        }
        if let Some(page_size) = args.page_size {
            self.directory.page_size = page_size;
        }
        if let Some(timeout) = args.timeout {
            self.directory.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.no_chart {
            self.report.include_chart = false;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
        if args.quiet {
            self.general.verbose = false;
            self.directory.show_progress = false;
        }
    }

    /// Check settings that only make sense once file and CLI are merged.
    pub fn validate(&self) -> Result<(), String> {
        match self.directory.source {
            DirectoryKind::File => match self.directory.input {
                None => return Err("An input file is required for --source file".to_string()),
                Some(ref input) if !input.is_file() => {
                    return Err(format!("Input file does not exist: {}", input.display()));
                }
                Some(_) => {}
            },
            DirectoryKind::Firestore => {
                if self.directory.project_id.is_none() {
                    return Err("A project ID is required for --source firestore".to_string());
                }
                let url = &self.directory.firestore_url;
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err("Firestore URL must start with 'http://' or 'https://'".to_string());
                }
            }
        }

        if self.directory.role_field.trim().is_empty() {
            return Err("Role field name cannot be empty".to_string());
        }
        if self.directory.page_size == 0 {
            return Err("Page size must be at least 1".to_string());
        }
        if self.directory.timeout_seconds == 0 {
            return Err("Timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
