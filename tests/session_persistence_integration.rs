//! Session cookies survive a process restart through the cookie store file.

mod support;

use support::gated_session;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use time::macros::datetime;
use url_importer::auth::{CookieFile, CookieRecord, Freshness, SessionAuthenticator};
use url_importer::download::ClientSettings;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn test_store_round_trip_preserves_every_field() {
    let dir = TempDir::new().unwrap();
    let store = CookieFile::at(dir.path().join("nested/cookies.json"));
    let original = vec![
        CookieRecord::new(
            "sid",
            "v1",
            "copycase.com",
            "/",
            Some(datetime!(2030-01-02 03:04:05 UTC)),
        ),
        CookieRecord::new("pref", "dark", ".copycase.com", "/account", None),
    ];

    store.save(&original).unwrap();
    let loaded = store.load();
    store.save(&loaded).unwrap();
    let reloaded = store.load();

    assert_eq!(reloaded.len(), 2);
    for expected in &original {
        let found = reloaded
            .iter()
            .find(|c| c.name == expected.name)
            .unwrap();
        assert_eq!(found.value(), expected.value());
        assert_eq!(found.domain, expected.domain);
        assert_eq!(found.path, expected.path);
        assert_eq!(found.expires, expected.expires);
    }
    assert!(reloaded.iter().any(CookieRecord::is_session));
}

#[test]
fn test_corrupt_store_loads_as_empty() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("cookies.json");
    std::fs::write(&file, "{ not json").unwrap();

    assert!(CookieFile::at(&file).load().is_empty());
}

#[tokio::test]
async fn test_login_cookies_are_reused_by_next_process() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form></form>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sid=persisted; Path=/; Max-Age=3600"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/whoami"))
        .and(header("cookie", "sid=persisted"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = gated_session(&server.uri(), dir.path());

    // First process: log in, cookies land in the store.
    {
        let store = CookieFile::for_session(&session).unwrap();
        let auth = SessionAuthenticator::new(session.clone(), ClientSettings::default(), store);
        auth.force_login().await.unwrap();
        assert_eq!(auth.freshness(), Freshness::AuthenticatedThisProcess);
    }

    // Second process: login disabled, restored cookies are still sent.
    let mut restarted = session;
    restarted.enabled = false;
    let store = CookieFile::for_session(&restarted).unwrap();
    let auth = SessionAuthenticator::new(restarted, ClientSettings::default(), store);
    assert_eq!(auth.freshness(), Freshness::RestoredFromDisk);

    let client = auth.authenticated_client().await.unwrap();
    let response = client
        .get(format!("{}/whoami", server.uri()))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}
