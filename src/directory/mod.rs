//! User directory access.
//!
//! A user directory supplies the snapshot of user records the dashboard
//! aggregates. Fetch failures are reported as [`DirectoryError`] so the
//! caller can tell a failed fetch apart from an empty user base.

pub mod file;
pub mod firestore;

pub use file::JsonFileDirectory;
pub use firestore::{FirestoreDirectory, FirestoreOptions};

use crate::config::DirectoryConfig;
use crate::models::UserRecord;
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Errors raised while fetching users.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to read user export {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in user data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported user data layout: {0}")]
    Layout(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot reach user directory: {0}")]
    Http(#[from] reqwest::Error),

    #[error("User directory returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Pagination stalled on repeated page token {0:?}")]
    Pagination(String),
}

/// Source of user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Human-readable description of where users come from.
    fn describe(&self) -> String;

    /// Fetch every user as a fully materialized snapshot.
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, DirectoryError>;
}

/// Which directory implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    /// JSON export on disk (default)
    #[default]
    File,
    /// Firestore collection over the REST API
    Firestore,
}

/// Build the configured directory.
pub fn from_config(config: &DirectoryConfig) -> Result<Box<dyn UserDirectory>> {
    match config.source {
        DirectoryKind::File => {
            let Some(ref input) = config.input else {
                bail!("No input file configured for the file directory (use --input)");
            };
            debug!("Using JSON export at {}", input.display());
            Ok(Box::new(JsonFileDirectory::new(
                input.clone(),
                config.role_field.clone(),
            )))
        }
        DirectoryKind::Firestore => {
            let Some(ref project_id) = config.project_id else {
                bail!("No Firestore project configured (use --project-id)");
            };
            let options = FirestoreOptions {
                base_url: config.firestore_url.clone(),
                project_id: project_id.clone(),
                collection: config.collection.clone(),
                token: config.token.clone(),
                page_size: config.page_size,
                timeout_seconds: config.timeout_seconds,
                role_field: config.role_field.clone(),
                show_progress: config.show_progress,
            };
            Ok(Box::new(FirestoreDirectory::new(options)?))
        }
    }
}

/// Read the role from a plain user object. Non-text values count as absent.
pub(crate) fn role_from_object(user: &Value, role_field: &str) -> Option<String> {
    user.get(role_field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Read the role from a Firestore REST document (`fields.<name>.stringValue`).
pub(crate) fn role_from_document(document: &Value, role_field: &str) -> Option<String> {
    document
        .get("fields")
        .and_then(|fields| fields.get(role_field))
        .and_then(|value| value.get("stringValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_from_object() {
        assert_eq!(
            role_from_object(&json!({"role": "Admin"}), "role"),
            Some("Admin".to_string())
        );
        assert_eq!(role_from_object(&json!({"role": 7}), "role"), None);
        assert_eq!(role_from_object(&json!({"role": null}), "role"), None);
        assert_eq!(role_from_object(&json!({"name": "x"}), "role"), None);
        assert_eq!(role_from_object(&json!("admin"), "role"), None);
    }

    #[test]
    fn test_role_from_document() {
        let doc = json!({
            "name": "projects/p/databases/(default)/documents/users/u1",
            "fields": {"role": {"stringValue": "caregiver"}}
        });
        assert_eq!(role_from_document(&doc, "role"), Some("caregiver".to_string()));

        let numeric = json!({"fields": {"role": {"integerValue": "3"}}});
        assert_eq!(role_from_document(&numeric, "role"), None);

        let missing = json!({"fields": {}});
        assert_eq!(role_from_document(&missing, "role"), None);
    }

    #[test]
    fn test_from_config_requires_input() {
        let config = DirectoryConfig {
            input: None,
            ..DirectoryConfig::default()
        };
        assert!(from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_requires_project() {
        let config = DirectoryConfig {
            source: DirectoryKind::Firestore,
            project_id: None,
            ..DirectoryConfig::default()
        };
        assert!(from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_builds_firestore() {
        let config = DirectoryConfig {
            source: DirectoryKind::Firestore,
            project_id: Some("careconnect-demo".to_string()),
            ..DirectoryConfig::default()
        };
        let directory = from_config(&config).unwrap();
        assert!(directory.describe().contains("careconnect-demo"));
    }
}
