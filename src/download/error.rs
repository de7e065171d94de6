//! Error types for the download module.
//!
//! Every variant carries the URL or path it concerns so a batch report can
//! show per-item causes without extra bookkeeping.

use std::path::PathBuf;

use thiserror::Error;

use crate::auth::AuthError;

/// Errors that can occur while fetching one URL to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create dir, create file, write, rename).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The gated host still refused access after a fresh login.
    #[error("[AUTH] access denied (HTTP {status}) downloading {url} after re-login")]
    AuthRequired {
        /// The URL that was refused.
        url: String,
        /// The HTTP status code of the retried request (401 or 403).
        status: u16,
    },

    /// Logging in to the gated host failed.
    #[error("[AUTH] login failed while downloading {url}: {source}")]
    Login {
        /// The URL being downloaded.
        url: String,
        /// The login failure.
        #[source]
        source: AuthError,
    },

    /// The batch was cancelled while this URL was in flight.
    #[error("download cancelled: {url}")]
    Cancelled {
        /// The URL that was being downloaded.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, classifying timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network { url, source }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an authentication-required error for a failed retry.
    pub fn auth_required(url: impl Into<String>, status: u16) -> Self {
        Self::AuthRequired {
            url: url.into(),
            status,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Wraps a login failure.
    pub fn login(url: impl Into<String>, source: AuthError) -> Self {
        Self::Login {
            url: url.into(),
            source,
        }
    }
}

// No From<reqwest::Error>/From<io::Error>: every variant needs the url or path
// the source error does not carry.
