//! Authentication and cookie management for the gated host.
//!
//! [`SessionAuthenticator`] logs in (API first, then the HTML form) and keeps
//! the resulting cookies in a [`SessionJar`] that is mirrored to a
//! [`CookieFile`] on disk between runs.

mod cookies;
mod csrf;
mod error;
mod session;
mod storage;

pub use cookies::{CookieRecord, SessionJar};
pub use csrf::{CsrfField, extract_csrf_field};
pub use error::{AuthError, BODY_SNIPPET_CHARS};
pub use session::{Freshness, LoginMethod, SessionAuthenticator, SessionState};
pub use storage::{CookieFile, StorageError};
