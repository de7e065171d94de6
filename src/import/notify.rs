//! Library notification after a batch.
//!
//! A media server does not always watch its library folders, so after a batch
//! the importer tells it which directory changed.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Header carrying the media server API key.
pub const MEDIA_SERVER_TOKEN_HEADER: &str = "X-Emby-Token";

/// Errors from a library notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification request could not be sent.
    #[error("library scan request to {url} failed: {source}")]
    Network {
        /// Notification endpoint.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The media server answered with a non-success status.
    #[error("library scan request to {url} returned HTTP {status}")]
    Status {
        /// Notification endpoint.
        url: String,
        /// Response status.
        status: u16,
    },
}

/// Signals that the contents of a directory changed.
#[async_trait]
pub trait LibraryNotifier: Send + Sync {
    /// Called once after a batch with the destination folder.
    async fn directory_changed(&self, folder: &Path) -> Result<(), NotifyError>;
}

/// Logs the change and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl LibraryNotifier for LogNotifier {
    async fn directory_changed(&self, folder: &Path) -> Result<(), NotifyError> {
        info!(folder = %folder.display(), "library folder changed");
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MediaUpdateRequest<'a> {
    updates: [MediaUpdate<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MediaUpdate<'a> {
    path: &'a str,
    update_type: &'static str,
}

/// Posts a "media updated" request to a Jellyfin/Emby style server.
#[derive(Clone)]
pub struct MediaServerNotifier {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for MediaServerNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaServerNotifier")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl MediaServerNotifier {
    /// Creates a notifier posting to `url`.
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl LibraryNotifier for MediaServerNotifier {
    async fn directory_changed(&self, folder: &Path) -> Result<(), NotifyError> {
        let folder = folder.to_string_lossy();
        let body = MediaUpdateRequest {
            updates: [MediaUpdate {
                path: &folder,
                update_type: "Modified",
            }],
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header(MEDIA_SERVER_TOKEN_HEADER, key);
        }

        debug!(url = %self.url, folder = %folder, "requesting library scan");
        let response = request.send().await.map_err(|source| NotifyError::Network {
            url: self.url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        info!(folder = %folder, "library scan requested");
        Ok(())
    }
}
