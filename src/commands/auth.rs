//! Auth command handlers: log in and clear persisted cookies.

use anyhow::{Context, Result, anyhow};
use tracing::info;
use url_importer::{CookieFile, ImporterConfig};

use super::build_authenticator;

pub async fn run_auth_login_command(config: &ImporterConfig) -> Result<()> {
    let session = build_authenticator(config)?;
    info!(host = %config.session.gated_host, "Logging in");

    session
        .force_login()
        .await
        .map_err(|error| anyhow!("Login failed: {error}"))?;

    info!(
        cookies = session.jar().len(),
        path = %session.store().path().display(),
        "Session cookies saved"
    );
    Ok(())
}

pub fn run_auth_clear_command(config: &ImporterConfig) -> Result<()> {
    let store = CookieFile::for_session(&config.session)
        .context("Failed to resolve the session cookie file")?;
    let removed = store
        .clear()
        .map_err(|error| anyhow!("Failed to clear persisted cookies: {error}"))?;

    if removed {
        info!(path = %store.path().display(), "Cleared persisted session cookies");
    } else {
        info!("No persisted session cookies found");
    }

    Ok(())
}
