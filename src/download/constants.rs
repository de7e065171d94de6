//! Constants for the download module.

/// Maximum redirects followed per request.
pub const MAX_REDIRECTS: usize = 10;

/// Status codes that mean the session is no longer accepted.
pub const SESSION_EXPIRED_STATUSES: &[u16] = &[401, 403];
