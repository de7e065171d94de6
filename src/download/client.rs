//! HTTP client construction.
//!
//! Two flavours share one configuration: the plain client used for ordinary
//! hosts, and the session client that carries the authenticator's cookie jar.
//! Both follow redirects, decompress gzip bodies, identify themselves with the
//! importer User-Agent and use a long whole-request timeout suited to large
//! media files.

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use tracing::instrument;

use super::constants::MAX_REDIRECTS;
use crate::auth::SessionJar;
use crate::config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, ImporterConfig};
use crate::user_agent;

/// Timeout settings shared by all importer clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Whole-request timeout, body included.
    pub request_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl ClientSettings {
    /// Takes the timeouts from the importer configuration.
    #[must_use]
    pub fn from_config(config: &ImporterConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

/// Builds a client without cookie handling.
///
/// # Errors
///
/// Returns the reqwest builder error (e.g. TLS backend initialisation failure).
#[instrument(level = "debug")]
pub fn build_plain_client(settings: ClientSettings) -> Result<Client, reqwest::Error> {
    base_client_builder(settings).build()
}

/// Builds a client whose cookies live in `jar`.
///
/// # Errors
///
/// Returns the reqwest builder error (e.g. TLS backend initialisation failure).
#[instrument(level = "debug", skip(jar))]
pub fn build_session_client(
    settings: ClientSettings,
    jar: Arc<SessionJar>,
) -> Result<Client, reqwest::Error> {
    base_client_builder(settings).cookie_provider(jar).build()
}

fn base_client_builder(settings: ClientSettings) -> ClientBuilder {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .gzip(true)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .user_agent(user_agent::importer_user_agent())
}
