//! URL Importer Library
//!
//! Downloads remote files into a media library folder, logging in to one
//! session-gated site when its URLs are requested.
//!
//! # Architecture
//!
//! - [`config`] - Importer and session configuration
//! - [`auth`] - Cookie jar, cookie store file, CSRF scraping and the session authenticator
//! - [`download`] - HTTP clients and the authenticated fetcher
//! - [`import`] - Batch driver, progress and library notification sinks

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod download;
pub mod import;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use auth::{
    AuthError, CookieFile, CookieRecord, Freshness, SessionAuthenticator, SessionJar,
    SessionState, StorageError,
};
pub use config::{ConfigError, ImporterConfig, SessionConfig};
pub use download::{AuthenticatedFetcher, ClientSettings, DownloadError, FetchOutcome};
pub use import::{
    ImportError, ImportReport, LibraryNotifier, LogNotifier, MediaServerNotifier, NoopProgress,
    ProgressSink, run_import,
};
