//! End-to-end CLI tests for the url-importer binary.

#![allow(deprecated)]

mod support;

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Command isolated from the user's real config directory.
fn importer(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("url-importer").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let tempdir = TempDir::new().unwrap();
    importer(tempdir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download files into a media library folder"));
}

#[test]
fn test_binary_version_displays_version() {
    let tempdir = TempDir::new().unwrap();
    importer(tempdir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("url-importer"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let tempdir = TempDir::new().unwrap();
    importer(tempdir.path())
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_without_destination_fails() {
    let tempdir = TempDir::new().unwrap();
    importer(tempdir.path())
        .arg("https://example.com/a.mkv")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("destination folder is not configured"));
}

#[test]
fn test_binary_missing_explicit_config_fails() {
    let tempdir = TempDir::new().unwrap();
    importer(tempdir.path())
        .arg("--config")
        .arg(tempdir.path().join("nope.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_config_show_redacts_password() {
    let tempdir = TempDir::new().unwrap();
    let config = tempdir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{
            "destination_folder": "/media/inbox",
            "urls": ["https://copycase.com/files/a.mkv"],
            "session": { "enabled": true, "username": "ann", "password": "hunter2" }
        }"#,
    )
    .unwrap();

    importer(tempdir.path())
        .args(["config", "show", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("destination_folder = /media/inbox"))
        .stdout(predicate::str::contains("session.username = ann"))
        .stdout(predicate::str::contains("session.password = <set>"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_auth_clear_removes_cookie_file() {
    let tempdir = TempDir::new().unwrap();
    let cookie_dir = tempdir.path().join("url-importer");
    std::fs::create_dir_all(&cookie_dir).unwrap();
    let cookie_file = cookie_dir.join("copycase_cookies.json");
    std::fs::write(&cookie_file, r#"{"cookies":[]}"#).unwrap();

    importer(tempdir.path())
        .args(["auth", "clear"])
        .assert()
        .success();
    assert!(!cookie_file.exists());
}

#[test]
fn test_auth_login_without_credentials_fails() {
    let tempdir = TempDir::new().unwrap();
    importer(tempdir.path())
        .args(["auth", "login"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Login failed"));
}

#[tokio::test]
async fn test_binary_exit_code_partial_success_is_two() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/ok.mkv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MKV".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fail.mkv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let dest = tempdir.path().join("library");

    let assert = importer(tempdir.path())
        .arg("-q")
        .arg("--no-scan")
        .arg("--dest")
        .arg(&dest)
        .arg(format!("{}/ok.mkv", mock_server.uri()))
        .arg(format!("{}/fail.mkv", mock_server.uri()))
        .assert()
        .failure();

    assert_eq!(
        assert.get_output().status.code(),
        Some(2),
        "partial success must yield exit code 2"
    );
    assert_eq!(std::fs::read(dest.join("ok.mkv")).unwrap(), b"MKV");
    assert!(!dest.join("fail.mkv").exists());
}

#[tokio::test]
async fn test_binary_all_success_exits_zero() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/one.mkv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"1".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let dest = tempdir.path().join("library");
    let url = format!("{}/one.mkv", mock_server.uri());

    for _ in 0..2 {
        importer(tempdir.path())
            .arg("--dest")
            .arg(&dest)
            .arg(&url)
            .assert()
            .success();
    }
    assert!(dest.join("one.mkv").exists());
}
