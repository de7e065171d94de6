//! Login failure taxonomy.

use thiserror::Error;

/// Maximum number of response-body characters kept for diagnostics.
pub const BODY_SNIPPET_CHARS: usize = 300;

/// Errors from a single login attempt.
///
/// A failed attempt leaves the session unauthenticated; nothing here is
/// retried automatically.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form login needs a username and password and at least one is missing.
    #[error("login credentials for {host} are not configured")]
    MissingCredentials {
        /// Gated host the credentials are for.
        host: String,
    },

    /// The login request never produced a response.
    #[error("network error during login at {url}: {source}")]
    Network {
        /// Login URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The login page itself could not be fetched.
    #[error("login page {url} returned HTTP {status}")]
    LoginPage {
        /// Login page URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The site answered the credential POST with a failure status.
    #[error("login rejected (HTTP {status}). Body: {body_snippet}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// First [`BODY_SNIPPET_CHARS`] characters of the response body.
        body_snippet: String,
    },

    /// The session HTTP client could not be constructed.
    #[error("failed to build session HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl AuthError {
    /// Creates a network error for `url`.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a rejection error, truncating `body` to [`BODY_SNIPPET_CHARS`] characters.
    pub fn rejected(status: u16, body: &str) -> Self {
        Self::Rejected {
            status,
            body_snippet: body.chars().take(BODY_SNIPPET_CHARS).collect(),
        }
    }

    /// Returns true for configuration problems that no retry can fix.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredentials { .. } | Self::ClientBuild(_))
    }
}
