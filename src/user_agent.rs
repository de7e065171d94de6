//! Client identity sent with every request.
//!
//! The session client and the plain client share one User-Agent so the gated
//! host sees the same identity before and after login.

/// Product token used in the User-Agent header.
const PRODUCT: &str = "UrlImporter";

/// Fixed User-Agent for all importer HTTP traffic.
#[must_use]
pub(crate) fn importer_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version}")
}
