//! Importer configuration: what to download, where, and how to log in.
//!
//! Configuration is a JSON document, by default at
//! `$XDG_CONFIG_HOME/url-importer/config.json` (or
//! `~/.config/url-importer/config.json`). Every field is optional on disk;
//! missing fields take the defaults below.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

/// Directory name used under the platform config directory.
pub const APP_DIR_NAME: &str = "url-importer";

const CONFIG_FILE_NAME: &str = "config.json";

/// Default per-request timeout: large media files can take a long time.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30 * 60;

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

const MAX_TIMEOUT_SECS: u64 = 86_400;

const DEFAULT_GATED_HOST: &str = "copycase.com";
const DEFAULT_LOGIN_URL: &str = "https://copycase.com/login";
const DEFAULT_API_LOGIN_URL: &str = "https://copycase.com/api/login";
const DEFAULT_COOKIE_FILE_NAME: &str = "copycase_cookies.json";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid JSON for [`ImporterConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A batch run was requested without a destination folder.
    #[error("destination folder is not configured")]
    MissingDestination,
    /// A field holds a value outside its accepted range or format.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// Human readable reason.
        reason: String,
    },
}

/// Login settings for the session-gated host.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Enables logging in before talking to the gated host.
    pub enabled: bool,
    /// Host (and its subdomains) whose requests go through the session.
    pub gated_host: String,
    /// Account name.
    pub username: Option<String>,
    /// Account password (sensitive, never logged).
    pub password: Option<String>,
    /// HTML login form URL; used for both the token GET and the form POST.
    pub login_url: String,
    /// Optional JSON login endpoint tried before the form.
    pub api_login_url: Option<String>,
    /// File name of the persisted cookie store.
    pub cookie_file_name: String,
    /// Directory holding the cookie store; defaults to the app config dir.
    pub cookie_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gated_host: DEFAULT_GATED_HOST.to_string(),
            username: None,
            password: None,
            login_url: DEFAULT_LOGIN_URL.to_string(),
            api_login_url: Some(DEFAULT_API_LOGIN_URL.to_string()),
            cookie_file_name: DEFAULT_COOKIE_FILE_NAME.to_string(),
            cookie_dir: None,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("enabled", &self.enabled)
            .field("gated_host", &self.gated_host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("login_url", &self.login_url)
            .field("api_login_url", &self.api_login_url)
            .field("cookie_file_name", &self.cookie_file_name)
            .field("cookie_dir", &self.cookie_dir)
            .finish()
    }
}

impl SessionConfig {
    /// Returns `(username, password)` when both are set and non-blank.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = non_blank(self.username.as_deref())?;
        let password = non_blank(self.password.as_deref())?;
        Some((username, password))
    }

    /// Returns the API login URL when configured and non-blank.
    #[must_use]
    pub fn api_login_url(&self) -> Option<&str> {
        non_blank(self.api_login_url.as_deref())
    }

    /// Returns true when `host` is the gated host or one of its subdomains.
    #[must_use]
    pub fn is_gated_host(&self, host: &str) -> bool {
        let gated = normalize_host(&self.gated_host);
        if gated.is_empty() {
            return false;
        }
        let host = normalize_host(host);
        host == gated
            || host
                .strip_suffix(gated.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    }

    /// Returns true when `url` targets the gated host.
    #[must_use]
    pub fn is_gated_url(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| self.is_gated_host(host))
    }
}

/// Full importer configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImporterConfig {
    /// Library folder that receives downloaded files.
    pub destination_folder: PathBuf,
    /// URLs fetched by a batch run, in order.
    pub urls: Vec<String>,
    /// Replace files that already exist instead of skipping them.
    pub overwrite_if_exists: bool,
    /// Notify the media library after a batch.
    pub trigger_library_scan: bool,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Media server endpoint notified after a batch.
    pub library_scan_url: Option<String>,
    /// Token sent to the media server (sensitive).
    pub library_api_key: Option<String>,
    /// Gated-host login settings.
    pub session: SessionConfig,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            destination_folder: PathBuf::new(),
            urls: Vec::new(),
            overwrite_if_exists: false,
            trigger_library_scan: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            library_scan_url: None,
            library_api_key: None,
            session: SessionConfig::default(),
        }
    }
}

impl fmt::Debug for ImporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImporterConfig")
            .field("destination_folder", &self.destination_folder)
            .field("urls", &self.urls)
            .field("overwrite_if_exists", &self.overwrite_if_exists)
            .field("trigger_library_scan", &self.trigger_library_scan)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("library_scan_url", &self.library_scan_url)
            .field(
                "library_api_key",
                &self.library_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("session", &self.session)
            .finish()
    }
}

impl ImporterConfig {
    /// Reads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a config document without validating it.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `raw` is not a valid config document.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Checks value ranges and URL formats.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout("request_timeout_secs", self.request_timeout_secs)?;
        validate_timeout("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_cookie_file_name(&self.session.cookie_file_name)?;
        validate_url("session.login_url", &self.session.login_url)?;
        if let Some(api_url) = self.session.api_login_url() {
            validate_url("session.api_login_url", api_url)?;
        }
        if let Some(scan_url) = non_blank(self.library_scan_url.as_deref()) {
            validate_url("library_scan_url", scan_url)?;
        }
        Ok(())
    }

    /// Returns the destination folder, failing when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDestination`] when the folder is empty.
    pub fn require_destination(&self) -> Result<&Path, ConfigError> {
        if self.destination_folder.as_os_str().is_empty()
            || self.destination_folder.to_string_lossy().trim().is_empty()
        {
            return Err(ConfigError::MissingDestination);
        }
        Ok(&self.destination_folder)
    }
}

/// Returns the per-user app config directory (`.../url-importer`).
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

/// Returns the default config file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(xdg) = xdg_config_home {
        return Some(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Some(home.join(".config").join(APP_DIR_NAME));
    }
    app_data.map(|app_data| app_data.join(APP_DIR_NAME))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn validate_timeout(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside 1..={MAX_TIMEOUT_SECS}"),
        });
    }
    Ok(())
}

fn validate_cookie_file_name(name: &str) -> Result<(), ConfigError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(ConfigError::Invalid {
            field: "session.cookie_file_name",
            reason: "must be a plain file name".to_string(),
        });
    }
    if trimmed.contains(['/', '\\']) {
        return Err(ConfigError::Invalid {
            field: "session.cookie_file_name",
            reason: format!("'{trimmed}' must not contain path separators"),
        });
    }
    Ok(())
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("'{value}' is not a valid URL: {e}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("'{value}' must use http or https"),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_plugin_defaults() {
        let config = ImporterConfig::default();
        assert!(!config.overwrite_if_exists);
        assert!(config.trigger_library_scan);
        assert_eq!(config.request_timeout_secs, 1800);
        assert!(!config.session.enabled);
        assert_eq!(config.session.cookie_file_name, "copycase_cookies.json");
        assert_eq!(config.session.login_url, "https://copycase.com/login");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config = ImporterConfig::from_json_str(
            r#"{"destination_folder": "/media/library", "urls": ["https://a.example/x.mkv"],
                "session": {"enabled": true, "username": "ann"}}"#,
        )
        .unwrap();
        assert_eq!(config.destination_folder, PathBuf::from("/media/library"));
        assert_eq!(config.urls.len(), 1);
        assert!(config.session.enabled);
        assert_eq!(config.session.gated_host, "copycase.com");
        assert_eq!(config.session.username.as_deref(), Some("ann"));
        assert!(config.session.credentials().is_none());
    }

    #[test]
    fn test_credentials_reject_blank_values() {
        let mut session = SessionConfig {
            username: Some("ann".into()),
            password: Some("   ".into()),
            ..SessionConfig::default()
        };
        assert!(session.credentials().is_none());
        session.password = Some("pw".into());
        assert_eq!(session.credentials(), Some(("ann", "pw")));
    }

    #[test]
    fn test_is_gated_host_matches_subdomains_only_on_label_boundary() {
        let session = SessionConfig::default();
        assert!(session.is_gated_host("copycase.com"));
        assert!(session.is_gated_host("WWW.CopyCase.com"));
        assert!(session.is_gated_host("cdn.copycase.com."));
        assert!(!session.is_gated_host("evilcopycase.com"));
        assert!(!session.is_gated_host("copycase.com.evil.net"));
    }

    #[test]
    fn test_require_destination_rejects_empty_folder() {
        let config = ImporterConfig::default();
        assert!(matches!(
            config.require_destination(),
            Err(ConfigError::MissingDestination)
        ));
    }

    #[test]
    fn test_validate_rejects_bad_timeout() {
        let config = ImporterConfig {
            request_timeout_secs: 0,
            ..ImporterConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_cookie_file_with_separator() {
        let mut config = ImporterConfig::default();
        config.session.cookie_file_name = "../cookies.json".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "session.cookie_file_name",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_non_http_login_url() {
        let mut config = ImporterConfig::default();
        config.session.login_url = "ftp://copycase.com/login".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_api_login_url_is_treated_as_unset() {
        let mut config = ImporterConfig::default();
        config.session.api_login_url = Some("  ".to_string());
        assert!(config.session.api_login_url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_reports_parse_errors_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        let err = ImporterConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = ImporterConfig::default();
        config.session.password = Some("hunter2".into());
        config.library_api_key = Some("k3y".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("k3y"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_resolve_config_dir_prefers_xdg_over_home() {
        let resolved = resolve_config_dir(
            Some(PathBuf::from("/tmp/xdg")),
            Some(PathBuf::from("/tmp/home")),
            None,
        );
        assert_eq!(resolved, Some(PathBuf::from("/tmp/xdg/url-importer")));
    }

    #[test]
    fn test_resolve_config_dir_falls_back_to_home_then_appdata() {
        assert_eq!(
            resolve_config_dir(None, Some(PathBuf::from("/tmp/home")), None),
            Some(PathBuf::from("/tmp/home/.config/url-importer"))
        );
        assert_eq!(
            resolve_config_dir(None, None, Some(PathBuf::from("/tmp/appdata"))),
            Some(PathBuf::from("/tmp/appdata/url-importer"))
        );
        assert_eq!(resolve_config_dir(None, None, None), None);
    }

    #[test]
    fn test_sanitize_env_path_rejects_blank_values() {
        assert!(sanitize_env_path(Some(OsString::from(""))).is_none());
        assert!(sanitize_env_path(Some(OsString::from("  "))).is_none());
    }
}
