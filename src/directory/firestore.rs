//! Firestore REST directory.
//!
//! Lists every document of the users collection through the Firestore
//! REST API, following page tokens until the listing is exhausted.

use super::{role_from_document, DirectoryError, UserDirectory};
use crate::models::UserRecord;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info};

/// Longest error response body kept in [`DirectoryError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for the Firestore directory.
#[derive(Debug, Clone)]
pub struct FirestoreOptions {
    pub base_url: String,
    pub project_id: String,
    pub collection: String,
    /// OAuth bearer token, if the rules require authentication.
    pub token: Option<String>,
    pub page_size: u32,
    pub timeout_seconds: u64,
    pub role_field: String,
    pub show_progress: bool,
}

/// One page of a `documents.list` response.
#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Value>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

/// User directory backed by a Firestore collection.
pub struct FirestoreDirectory {
    options: FirestoreOptions,
    http_client: reqwest::Client,
}

impl FirestoreDirectory {
    /// Create a directory client.
    pub fn new(options: FirestoreOptions) -> Result<Self, DirectoryError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self {
            options,
            http_client,
        })
    }

    /// URL of the collection listing endpoint.
    pub fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.options.base_url.trim_end_matches('/'),
            self.options.project_id,
            self.options.collection
        )
    }

    async fn fetch_page(
        &self,
        page_token: Option<&str>,
    ) -> Result<(Vec<UserRecord>, Option<String>), DirectoryError> {
        let mut request = self
            .http_client
            .get(self.documents_url())
            .query(&[("pageSize", self.options.page_size.to_string())]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        if let Some(ref bearer) = self.options.token {
            request = request.bearer_auth(bearer);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Timeout(self.options.timeout_seconds)
            } else {
                DirectoryError::Http(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = truncate_body(response.text().await.unwrap_or_default());
            return Err(DirectoryError::Status { status, body });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Timeout(self.options.timeout_seconds)
            } else {
                DirectoryError::Http(e)
            }
        })?;

        parse_page(&body, &self.options.role_field)
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.options.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Listing {}...", self.options.collection));
        Some(pb)
    }
}

#[async_trait]
impl UserDirectory for FirestoreDirectory {
    fn describe(&self) -> String {
        format!(
            "firestore:{}/{}",
            self.options.project_id, self.options.collection
        )
    }

    async fn fetch_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        info!("Fetching users from {}", self.documents_url());

        let progress = self.spinner();
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0usize;

        loop {
            let (page, next) = match self.fetch_page(page_token.as_deref()).await {
                Ok(result) => result,
                Err(e) => {
                    if let Some(ref pb) = progress {
                        pb.abandon_with_message("Fetch failed");
                    }
                    return Err(e);
                }
            };
            pages += 1;
            records.extend(page);
            debug!("Page {}: {} users so far", pages, records.len());

            if let Some(ref pb) = progress {
                pb.set_message(format!("Fetched {} users", records.len()));
            }

            match next {
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    if let Some(ref pb) = progress {
                        pb.abandon_with_message("Fetch failed");
                    }
                    return Err(DirectoryError::Pagination(token));
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        if let Some(ref pb) = progress {
            pb.finish_and_clear();
        }

        info!("Fetched {} users in {} page(s)", records.len(), pages);
        Ok(records)
    }
}

/// Parse one listing page into records and the next page token.
///
/// An empty collection has no `documents` key at all. An empty
/// `nextPageToken` marks the last page.
fn parse_page(
    body: &str,
    role_field: &str,
) -> Result<(Vec<UserRecord>, Option<String>), DirectoryError> {
    let page: ListDocumentsResponse = serde_json::from_str(body)?;

    let records = page
        .documents
        .iter()
        .map(|doc| UserRecord {
            role: role_from_document(doc, role_field),
        })
        .collect();

    let next = page.next_page_token.filter(|t| !t.is_empty());
    Ok((records, next))
}

/// Cut an error body down to [`MAX_ERROR_BODY`] bytes on a char boundary.
fn truncate_body(mut body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }

    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body.truncate(end);
    body.push_str("...");
    body
}
