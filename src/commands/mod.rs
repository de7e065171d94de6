//! CLI command handlers.

mod auth;
mod config;
mod import;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;
use url_importer::config::default_config_path;
use url_importer::{ClientSettings, CookieFile, ImporterConfig, SessionAuthenticator};

pub use auth::{run_auth_clear_command, run_auth_login_command};
pub use config::run_config_show_command;
pub use import::run_import_command;

/// Configuration plus where it came from.
pub struct LoadedConfig {
    pub config: ImporterConfig,
    pub path: Option<PathBuf>,
    pub loaded_from_file: bool,
}

/// Loads the config file named on the command line, or the default one.
///
/// An explicit path must exist; a missing default file means defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
        let config = ImporterConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        return Ok(LoadedConfig {
            config,
            path: Some(path.to_path_buf()),
            loaded_from_file: true,
        });
    }

    let path = default_config_path();
    match path.as_deref() {
        Some(default) if default.is_file() => {
            let config = ImporterConfig::from_file(default)
                .with_context(|| format!("Failed to load config {}", default.display()))?;
            Ok(LoadedConfig {
                config,
                path,
                loaded_from_file: true,
            })
        }
        _ => {
            debug!(path = ?path, "no config file, using defaults");
            Ok(LoadedConfig {
                config: ImporterConfig::default(),
                path,
                loaded_from_file: false,
            })
        }
    }
}

pub(crate) fn build_authenticator(config: &ImporterConfig) -> Result<Arc<SessionAuthenticator>> {
    let store = CookieFile::for_session(&config.session)
        .context("Failed to resolve the session cookie file")?;
    Ok(Arc::new(SessionAuthenticator::new(
        config.session.clone(),
        ClientSettings::from_config(config),
        store,
    )))
}
