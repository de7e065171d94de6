#![allow(dead_code)]

pub mod socket_guard;

use std::path::Path;

use url_importer::config::SessionConfig;

/// Session settings that treat the local mock server as the gated host.
#[must_use]
pub fn gated_session(server_uri: &str, cookie_dir: &Path) -> SessionConfig {
    SessionConfig {
        enabled: true,
        gated_host: "127.0.0.1".to_string(),
        username: Some("ann".to_string()),
        password: Some("s3cret".to_string()),
        login_url: format!("{server_uri}/login"),
        api_login_url: None,
        cookie_file_name: "cookies.json".to_string(),
        cookie_dir: Some(cookie_dir.to_path_buf()),
    }
}
