//! HTTP downloads streamed to disk.
//!
//! [`AuthenticatedFetcher`] is the entry point: it picks the session client
//! for the gated host or a plain client for everything else, streams the body
//! into a temporary sibling file and renames it into place.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use url_importer::auth::{CookieFile, SessionAuthenticator};
//! use url_importer::config::SessionConfig;
//! use url_importer::download::{AuthenticatedFetcher, ClientSettings, build_plain_client};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ClientSettings::default();
//! let session = SessionConfig::default();
//! let store = CookieFile::for_session(&session)?;
//! let fetcher = AuthenticatedFetcher::new(
//!     build_plain_client(settings)?,
//!     Arc::new(SessionAuthenticator::new(session, settings, store)),
//! );
//! let path = fetcher
//!     .fetch("https://example.com/movie.mkv", Path::new("./library"), false)
//!     .await?;
//! println!("Downloaded: {}", path.display());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod fetcher;
mod filename;

pub use client::{ClientSettings, build_plain_client, build_session_client};
pub use error::DownloadError;
pub use fetcher::{AuthenticatedFetcher, FetchOutcome};
pub use filename::{filename_from_url, partial_path, timestamped_filename};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
