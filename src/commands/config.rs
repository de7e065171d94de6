//! Config command handlers: show effective configuration.

use anyhow::Result;
use url_importer::auth::CookieFile;

use super::LoadedConfig;

fn redacted(value: Option<&str>) -> &'static str {
    if value.is_some() { "<set>" } else { "<unset>" }
}

pub fn run_config_show_command(loaded: &LoadedConfig) -> Result<()> {
    let config = &loaded.config;
    let session = &config.session;

    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded.loaded_from_file {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!(
        "destination_folder = {}",
        config.destination_folder.display()
    );
    println!("urls = {}", config.urls.len());
    println!("overwrite_if_exists = {}", config.overwrite_if_exists);
    println!("trigger_library_scan = {}", config.trigger_library_scan);
    println!("request_timeout_secs = {}", config.request_timeout_secs);
    println!("connect_timeout_secs = {}", config.connect_timeout_secs);
    println!(
        "library_scan_url = {}",
        config.library_scan_url.as_deref().unwrap_or("<unset>")
    );
    println!(
        "library_api_key = {}",
        redacted(config.library_api_key.as_deref())
    );
    println!("session.enabled = {}", session.enabled);
    println!("session.gated_host = {}", session.gated_host);
    println!(
        "session.username = {}",
        session.username.as_deref().unwrap_or("<unset>")
    );
    println!("session.password = {}", redacted(session.password.as_deref()));
    println!("session.login_url = {}", session.login_url);
    println!(
        "session.api_login_url = {}",
        session.api_login_url().unwrap_or("<unset>")
    );
    let cookie_file = CookieFile::for_session(session).map_or_else(
        |_| "<unresolved>".to_string(),
        |store| store.path().display().to_string(),
    );
    println!("session.cookie_file = {cookie_file}");

    Ok(())
}
