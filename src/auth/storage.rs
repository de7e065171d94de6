//! Persisted session cookies.
//!
//! The store is a small JSON document, one file per importer instance:
//!
//! ```json
//! { "cookies": [ { "name": "sid", "value": "…", "domain": "copycase.com",
//!                  "path": "/", "expires": "2030-01-01T00:00:00Z" } ] }
//! ```
//!
//! `expires: null` marks a session cookie. Cookies received with the `Secure`
//! attribute also carry `"secure": true`. Such records still round-trip
//! through the file; callers decide how much to trust them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::CookieRecord;
use crate::config::{SessionConfig, default_config_dir};

/// Errors for cookie store file operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No cookie directory was configured and no user config directory exists.
    #[error("unable to determine cookie directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCookies {
    #[serde(default)]
    cookies: Vec<StoredCookie>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
    domain: String,
    #[serde(default = "root_path")]
    path: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    expires: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    secure: bool,
}

fn root_path() -> String {
    "/".to_string()
}

impl StoredCookie {
    fn from_record(record: &CookieRecord) -> Self {
        Self {
            name: record.name.clone(),
            value: record.value().to_string(),
            domain: record.domain.clone(),
            path: record.path.clone(),
            expires: record.expires,
            secure: record.secure,
        }
    }

    fn into_record(self) -> CookieRecord {
        CookieRecord::new(self.name, self.value, self.domain, self.path, self.expires)
            .with_secure(self.secure)
    }
}

/// Cookie store file for one session.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    /// Uses an explicit store file path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the store file for `session`: `cookie_dir` (or the app config
    /// directory) joined with `cookie_file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ConfigDirUnavailable`] when no directory can be found.
    pub fn for_session(session: &SessionConfig) -> Result<Self, StorageError> {
        let dir = match &session.cookie_dir {
            Some(dir) => dir.clone(),
            None => default_config_dir().ok_or(StorageError::ConfigDirUnavailable)?,
        };
        Ok(Self::at(dir.join(&session.cookie_file_name)))
    }

    /// Store file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads persisted cookies.
    ///
    /// Never fails: a missing file yields an empty set, and an unreadable or
    /// corrupt file is logged and also yields an empty set so a fresh login
    /// can proceed.
    #[must_use]
    pub fn load(&self) -> Vec<CookieRecord> {
        match self.try_load() {
            Ok(Some(cookies)) => {
                debug!(path = %self.path.display(), cookies = cookies.len(), "loaded session cookies");
                cookies
            }
            Ok(None) => Vec::new(),
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    error = %error,
                    "failed to load session cookies; continuing without stored session"
                );
                Vec::new()
            }
        }
    }

    /// Loads persisted cookies, surfacing errors.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when reading or parsing fails.
    pub fn try_load(&self) -> Result<Option<Vec<CookieRecord>>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let stored: StoredCookies = serde_json::from_slice(&bytes)?;
        Ok(Some(
            stored
                .cookies
                .into_iter()
                .map(StoredCookie::into_record)
                .collect(),
        ))
    }

    /// Overwrites the store with the full cookie set.
    ///
    /// Failure is logged here and returned; the in-memory session stays usable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the directory or file cannot be written.
    pub fn save(&self, cookies: &[CookieRecord]) -> Result<(), StorageError> {
        let result = self.write(cookies);
        match &result {
            Ok(()) => {
                debug!(path = %self.path.display(), cookies = cookies.len(), "saved session cookies");
            }
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    error = %error,
                    "failed to save session cookies; session remains valid for this run"
                );
            }
        }
        result
    }

    /// Deletes the store file. Returns `true` when a file was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when removal fails.
    pub fn clear(&self) -> Result<bool, StorageError> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }

    fn write(&self, cookies: &[CookieRecord]) -> Result<(), StorageError> {
        let stored = StoredCookies {
            cookies: cookies.iter().map(StoredCookie::from_record).collect(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        set_owner_only_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = fs::Permissions::from_mode(0o600);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), StorageError> {
    Ok(())
}
