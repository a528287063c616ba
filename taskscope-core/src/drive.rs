//! Drive archive source — loads a trace from the files of a Google Drive folder
//!
//! Provides an `ArchiveSource` trait with one implementation:
//! - **DriveClient** — Drive v3 REST API with a bearer token
//!
//! A Drive folder stands in for the zip: its files are listed, downloaded
//! concurrently, and handed to the loader in listing order.

use crate::archive::{load_entries, LoadedTrace};
use crate::config::DriveConfig;
use crate::error::ArchiveError;
use crate::media::Asset;
use crate::session::Session;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::try_join_all;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

fn folder_id_re() -> &'static Regex {
    static FOLDER_ID_RE: OnceLock<Regex> = OnceLock::new();
    FOLDER_ID_RE.get_or_init(|| Regex::new(r"[-A-Za-z0-9_]{25,}").expect("valid folder id regex"))
}

// ============================================================================
// ArchiveSource trait
// ============================================================================

/// A file listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// Abstraction over remote folders that hold a trace and its screenshots.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// List the files directly inside `folder_id`.
    async fn list_files(&self, folder_id: &str, token: &str) -> Result<Vec<RemoteFile>, ArchiveError>;

    /// Download one file's content.
    async fn fetch_file(&self, file: &RemoteFile, token: &str) -> Result<Bytes, ArchiveError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Pull the folder id out of a pasted Drive link (or a bare id).
pub fn extract_folder_id(link: &str) -> Result<&str, ArchiveError> {
    folder_id_re()
        .find(link.trim())
        .map(|m| m.as_str())
        .ok_or(ArchiveError::InvalidFolderLink)
}

// ============================================================================
// Drive API structs (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Option<Vec<RemoteFile>>,
}

// ============================================================================
// DriveClient
// ============================================================================

/// Drive v3 client — lists folders and downloads file media.
#[derive(Debug, Clone)]
pub struct DriveClient {
    client: Client,
    base_url: String,
}

impl DriveClient {
    pub fn new(config: &DriveConfig) -> Result<Self, ArchiveError> {
        Self::with_base_url(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ArchiveError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ArchiveSource for DriveClient {
    async fn list_files(&self, folder_id: &str, token: &str) -> Result<Vec<RemoteFile>, ArchiveError> {
        let url = format!("{}/files", self.base_url);
        let query = format!("'{}' in parents", folder_id);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("fields", "files(id,name)")])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(folder_id, "Drive rejected the access token");
            return Err(ArchiveError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(code = status.as_u16(), body = %body, "Drive folder listing failed");
            return Err(ArchiveError::SourceUnavailable(format!(
                "Failed to fetch folder contents (HTTP {})",
                status.as_u16()
            )));
        }

        let listing: FileListResponse = response.json().await?;
        let files = listing.files.unwrap_or_default();
        tracing::debug!(folder_id, files = files.len(), "Listed Drive folder");
        Ok(files)
    }

    async fn fetch_file(&self, file: &RemoteFile, token: &str) -> Result<Bytes, ArchiveError> {
        let url = format!("{}/files/{}", self.base_url, file.id);

        let response = self
            .client
            .get(&url)
            .query(&[("alt", "media")])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ArchiveError::Unauthorized);
        }
        if !status.is_success() {
            tracing::error!(code = status.as_u16(), file = %file.name, "Drive download failed");
            return Err(ArchiveError::SourceUnavailable(format!(
                "Failed to fetch file {}",
                file.name
            )));
        }

        Ok(response.bytes().await?)
    }

    fn name(&self) -> &str {
        "google-drive"
    }
}

// ============================================================================
// Folder loading
// ============================================================================

/// List and download every file of a folder, preserving listing order.
pub async fn fetch_folder_entries(
    source: &dyn ArchiveSource,
    folder_id: &str,
    token: &str,
) -> Result<Vec<Asset>, ArchiveError> {
    let files = source.list_files(folder_id, token).await?;
    if files.is_empty() {
        return Err(ArchiveError::EmptyFolder);
    }

    let downloads = files.iter().map(|file| async move {
        let data = source.fetch_file(file, token).await?;
        Ok::<Asset, ArchiveError>(Asset::new(file.name.clone(), data))
    });
    let entries = try_join_all(downloads).await?;

    tracing::info!(
        source = source.name(),
        folder_id,
        files = entries.len(),
        "Downloaded folder"
    );
    Ok(entries)
}

/// Load the trace stored in the Drive folder behind `link`.
///
/// Requires a logged-in session. When the source rejects the token the
/// session is cleared so the caller can prompt for a new login.
pub async fn load_folder(
    source: &dyn ArchiveSource,
    session: &mut Session,
    link: &str,
) -> Result<LoadedTrace, ArchiveError> {
    let folder_id = extract_folder_id(link)?;
    let token = session.token()?.to_string();

    match fetch_folder_entries(source, folder_id, &token).await {
        Ok(entries) => load_entries(entries),
        Err(e) => {
            if e.is_unauthorized() {
                session.logout();
            }
            Err(e)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
