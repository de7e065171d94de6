//! Session authenticator for the gated host.
//!
//! The authenticator owns the session cookie jar, the cookie store file and
//! the shared session HTTP client. Each call to
//! [`SessionAuthenticator::authenticated_client`] logs in with the cheapest
//! strategy that works:
//!
//! 1. JSON API login, when an API URL and credentials are configured. Any 2xx
//!    is accepted as logged in; anything else falls through.
//! 2. HTML form login: fetch the login page, pick up the anti-forgery hidden
//!    input, post the credentials as a url-encoded form. 2xx or 302 succeeds.
//!
//! [`SessionAuthenticator::force_login`] skips the API shortcut and is used to
//! recover from an expired session. Logins are serialised by an async mutex.
//! Cookies are written to the store after every successful login.

use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Client;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

use super::csrf::extract_csrf_field;
use super::{AuthError, CookieFile, SessionJar};
use crate::config::SessionConfig;
use crate::download::{ClientSettings, build_session_client};

/// Where the session is in its login cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No login has succeeded in this process (or the last one failed).
    Unauthenticated,
    /// A login request is in flight.
    Authenticating,
    /// The last login succeeded.
    Authenticated,
}

/// How much the current cookies can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No cookies known.
    Unknown,
    /// Cookies came from the store file and were not verified yet.
    RestoredFromDisk,
    /// A login in this process produced the cookies.
    AuthenticatedThisProcess,
}

#[derive(Debug, Clone, Copy)]
struct SessionStatus {
    state: SessionState,
    freshness: Freshness,
}

#[derive(Serialize)]
struct ApiLoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Which login strategy produced the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    /// JSON API endpoint.
    Api,
    /// HTML form post.
    Form,
}

/// Owns the authenticated session for one gated host.
pub struct SessionAuthenticator {
    config: SessionConfig,
    settings: ClientSettings,
    jar: Arc<SessionJar>,
    store: CookieFile,
    client: OnceCell<Client>,
    login_lock: tokio::sync::Mutex<()>,
    status: Mutex<SessionStatus>,
}

impl std::fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthenticator")
            .field("gated_host", &self.config.gated_host)
            .field("enabled", &self.config.enabled)
            .field("store", &self.store.path())
            .field("cookies", &self.jar.len())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionAuthenticator {
    /// Creates the authenticator and restores cookies from `store`.
    ///
    /// The HTTP client itself is built lazily on first use.
    #[must_use]
    pub fn new(config: SessionConfig, settings: ClientSettings, store: CookieFile) -> Self {
        let restored = store.load();
        let freshness = if restored.is_empty() {
            Freshness::Unknown
        } else {
            info!(
                cookies = restored.len(),
                path = %store.path().display(),
                "restored session cookies"
            );
            Freshness::RestoredFromDisk
        };

        Self {
            config,
            settings,
            jar: Arc::new(SessionJar::with_records(restored)),
            store,
            client: OnceCell::new(),
            login_lock: tokio::sync::Mutex::new(()),
            status: Mutex::new(SessionStatus {
                state: SessionState::Unauthenticated,
                freshness,
            }),
        }
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The session cookie jar.
    #[must_use]
    pub fn jar(&self) -> &Arc<SessionJar> {
        &self.jar
    }

    /// The cookie store file.
    #[must_use]
    pub fn store(&self) -> &CookieFile {
        &self.store
    }

    /// Current login state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.status.lock().unwrap_or_else(PoisonError::into_inner).state
    }

    /// Current cookie freshness.
    #[must_use]
    pub fn freshness(&self) -> Freshness {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .freshness
    }

    /// Returns a client for requests to the gated host, logging in first when
    /// authentication is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the client cannot be built or when the form
    /// login (the last strategy) fails.
    #[instrument(skip(self), fields(host = %self.config.gated_host))]
    pub async fn authenticated_client(&self) -> Result<Client, AuthError> {
        let client = self.client().await?;
        if !self.config.enabled {
            debug!("session login disabled; using session client as-is");
            return Ok(client);
        }

        let _login = self.login_lock.lock().await;
        self.set_state(SessionState::Authenticating);

        if self.login_via_api(&client).await {
            self.mark_authenticated(LoginMethod::Api);
            return Ok(client);
        }

        self.run_form_login(&client).await?;
        Ok(client)
    }

    /// Logs in again through the form, bypassing the API shortcut.
    ///
    /// Existing cookies are kept; the response overwrites records with the
    /// same domain, path and name.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the form login fails.
    #[instrument(skip(self), fields(host = %self.config.gated_host))]
    pub async fn force_login(&self) -> Result<(), AuthError> {
        let client = self.client().await?;
        let _login = self.login_lock.lock().await;
        self.set_state(SessionState::Authenticating);
        self.run_form_login(&client).await
    }

    /// Drops all cookies in memory and deletes the store file.
    ///
    /// Returns `true` when a store file was removed.
    ///
    /// # Errors
    ///
    /// Returns the storage error when the file cannot be deleted.
    pub async fn clear_session(&self) -> Result<bool, super::StorageError> {
        let _login = self.login_lock.lock().await;
        self.jar.replace_all(Vec::new());
        {
            let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
            *status = SessionStatus {
                state: SessionState::Unauthenticated,
                freshness: Freshness::Unknown,
            };
        }
        self.store.clear()
    }

    async fn client(&self) -> Result<Client, AuthError> {
        self.client
            .get_or_try_init(|| async {
                debug!("building session HTTP client");
                build_session_client(self.settings, Arc::clone(&self.jar))
                    .map_err(AuthError::ClientBuild)
            })
            .await
            .cloned()
    }

    async fn run_form_login(&self, client: &Client) -> Result<(), AuthError> {
        match self.login_via_form(client).await {
            Ok(()) => {
                self.mark_authenticated(LoginMethod::Form);
                Ok(())
            }
            Err(e) => {
                self.set_state(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Returns true when the API login succeeded.
    async fn login_via_api(&self, client: &Client) -> bool {
        let (Some(api_url), Some((username, password))) =
            (self.config.api_login_url(), self.config.credentials())
        else {
            debug!("API login not configured; using form login");
            return false;
        };

        let payload = ApiLoginRequest { username, password };
        match client.post(api_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(status = response.status().as_u16(), "API login succeeded");
                true
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "API login failed; trying form login");
                false
            }
            Err(e) => {
                warn!(error = %e, "API login request failed; trying form login");
                false
            }
        }
    }

    async fn login_via_form(&self, client: &Client) -> Result<(), AuthError> {
        let Some((username, password)) = self.config.credentials() else {
            return Err(AuthError::MissingCredentials {
                host: self.config.gated_host.clone(),
            });
        };
        let login_url = self.config.login_url.as_str();
        info!(user = username, "logging in via login form");

        let page = client
            .get(login_url)
            .send()
            .await
            .map_err(|e| AuthError::network(login_url, e))?;
        if !page.status().is_success() {
            return Err(AuthError::LoginPage {
                url: login_url.to_string(),
                status: page.status().as_u16(),
            });
        }
        let html = page
            .text()
            .await
            .map_err(|e| AuthError::network(login_url, e))?;

        let mut form: Vec<(String, String)> = vec![
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        match extract_csrf_field(&html) {
            Some(token) => {
                debug!(field = %token.name, "found anti-forgery field");
                form.push((token.name, token.value));
            }
            None => debug!("login page has no anti-forgery field"),
        }

        let response = client
            .post(login_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::network(login_url, e))?;
        let status = response.status();
        if status.as_u16() == 302 || status.is_success() {
            info!(status = status.as_u16(), "form login succeeded");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), "form login rejected");
        Err(AuthError::rejected(status.as_u16(), &body))
    }

    fn mark_authenticated(&self, method: LoginMethod) {
        {
            let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
            *status = SessionStatus {
                state: SessionState::Authenticated,
                freshness: Freshness::AuthenticatedThisProcess,
            };
        }
        debug!(?method, "session authenticated");
        // Failure is logged inside save and is not fatal to the session.
        let _ = self.store.save(&self.jar.snapshot());
    }

    fn set_state(&self, state: SessionState) {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state = state;
    }
}
