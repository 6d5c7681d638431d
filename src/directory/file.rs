//! JSON export directory.
//!
//! Reads users from a JSON file exported from the backend. Three layouts
//! are accepted: a bare array of user objects, an object with a `users`
//! array, or a Firestore REST listing with a `documents` array.

use super::{role_from_document, role_from_object, DirectoryError, UserDirectory};
use crate::models::UserRecord;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

/// User directory backed by a JSON file.
pub struct JsonFileDirectory {
    path: PathBuf,
    role_field: String,
}

impl JsonFileDirectory {
    /// Create a directory reading from `path`, taking roles from `role_field`.
    pub fn new(path: impl Into<PathBuf>, role_field: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            role_field: role_field.into(),
        }
    }

    /// Parse an export into user records.
    ///
    /// Every array element becomes a record, even when it is not an object,
    /// so that it still counts toward the user total.
    pub fn parse_export(&self, content: &str) -> Result<Vec<UserRecord>, DirectoryError> {
        let root: Value = serde_json::from_str(content)?;

        let records = match root {
            Value::Array(users) => self.plain_records(&users),
            Value::Object(ref map) => {
                if let Some(users) = map.get("users") {
                    let users = users.as_array().ok_or_else(|| {
                        DirectoryError::Layout("\"users\" must be an array".to_string())
                    })?;
                    self.plain_records(users)
                } else if let Some(documents) = map.get("documents") {
                    let documents = documents.as_array().ok_or_else(|| {
                        DirectoryError::Layout("\"documents\" must be an array".to_string())
                    })?;
                    documents
                        .iter()
                        .map(|doc| UserRecord {
                            role: role_from_document(doc, &self.role_field),
                        })
                        .collect()
                } else {
                    return Err(DirectoryError::Layout(
                        "expected an array or an object with \"users\" or \"documents\""
                            .to_string(),
                    ));
                }
            }
            other => {
                return Err(DirectoryError::Layout(format!(
                    "expected an array or an object, found {}",
                    json_kind(&other)
                )));
            }
        };

        Ok(records)
    }

    fn plain_records(&self, users: &[Value]) -> Vec<UserRecord> {
        users
            .iter()
            .map(|user| UserRecord {
                role: role_from_object(user, &self.role_field),
            })
            .collect()
    }
}

#[async_trait]
impl UserDirectory for JsonFileDirectory {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn fetch_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        debug!("Reading user export: {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| DirectoryError::Io {
                path: self.path.clone(),
                source,
            })?;

        let records = self.parse_export(&content)?;
        info!("Loaded {} users from {}", records.len(), self.path.display());

        Ok(records)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::Category;
    use tempfile::TempDir;

    fn directory() -> JsonFileDirectory {
        JsonFileDirectory::new("users.json", "role")
    }

    #[test]
    fn test_parse_plain_array() {
        let records = directory()
            .parse_export(r#"[{"role": "admin"}, {"role": "Family"}, {"name": "no role"}]"#)
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].role.as_deref(), Some("admin"));
        assert_eq!(records[1].role.as_deref(), Some("Family"));
        assert_eq!(records[2].role, None);
    }

    #[test]
    fn test_parse_users_object() {
        let records = directory()
            .parse_export(r#"{"users": [{"role": "caregiver"}, {"role": 42}]}"#)
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].role.as_deref(), Some("caregiver"));
        assert_eq!(records[1].role, None);
    }

    #[test]
    fn test_parse_firestore_documents() {
        let content = r#"{
            "documents": [
                {"name": "a", "fields": {"role": {"stringValue": "older_adult"}}},
                {"name": "b", "fields": {"role": {"booleanValue": true}}}
            ]
        }"#;
        let records = directory().parse_export(content).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].role.as_deref(), Some("older_adult"));
        assert_eq!(records[1].role, None);
    }

    #[test]
    fn test_non_object_entries_still_count() {
        let records = directory()
            .parse_export(r#"[{"role": "admin"}, "admin", 5, null]"#)
            .unwrap();
        let (tally, _) = aggregate(&records);

        assert_eq!(tally.total(), 4);
        assert_eq!(tally.count(Category::Admin), 1);
        assert_eq!(tally.count(Category::Other), 3);
    }

    #[test]
    fn test_custom_role_field() {
        let dir = JsonFileDirectory::new("users.json", "userType");
        let records = dir
            .parse_export(r#"[{"userType": "family", "role": "admin"}]"#)
            .unwrap();

        assert_eq!(records[0].role.as_deref(), Some("family"));
    }

    #[test]
    fn test_rejects_unsupported_layouts() {
        assert!(matches!(
            directory().parse_export(r#"{"people": []}"#),
            Err(DirectoryError::Layout(_))
        ));
        assert!(matches!(
            directory().parse_export(r#"{"users": {"role": "admin"}}"#),
            Err(DirectoryError::Layout(_))
        ));
        assert!(matches!(
            directory().parse_export("42"),
            Err(DirectoryError::Layout(_))
        ));
        assert!(matches!(
            directory().parse_export("[{"),
            Err(DirectoryError::Json(_))
        ));
    }

    #[test]
    fn test_fetch_users_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("users.json");
        std::fs::write(&path, r#"[{"role": "admin"}, {"role": " CAREGIVER "}]"#).unwrap();

        let dir = JsonFileDirectory::new(&path, "role");
        let records = tokio_test::block_on(dir.fetch_users()).unwrap();

        assert_eq!(records.len(), 2);
        assert!(dir.describe().starts_with("file:"));
    }

    #[test]
    fn test_fetch_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let dir = JsonFileDirectory::new(temp_dir.path().join("missing.json"), "role");

        let result = tokio_test::block_on(dir.fetch_users());
        assert!(matches!(result, Err(DirectoryError::Io { .. })));
    }

    #[test]
    fn test_sample_export() {
        let records = directory()
            .parse_export(include_str!("../../fixtures/users.json"))
            .unwrap();
        let (tally, dist) = aggregate(&records);

        assert_eq!(tally.total(), 10);
        assert_eq!(tally.count(Category::OlderAdult), 3);
        assert_eq!(tally.count(Category::Caregiver), 2);
        assert_eq!(tally.count(Category::Other), 3);
        assert_eq!(tally.classified_total(), 7);
        assert_eq!(dist.fraction(Category::OlderAdult), 3.0 / 7.0);
    }

    #[test]
    fn test_empty_export_is_not_an_error() {
        let records = directory().parse_export("[]").unwrap();
        assert!(records.is_empty());
    }
}
