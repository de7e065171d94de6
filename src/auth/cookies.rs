//! Session cookie records and the jar that owns them.
//!
//! `reqwest::cookie::Jar` cannot enumerate its contents, so the session keeps
//! its own jar: a map keyed by `(domain, path, name)` that implements
//! [`reqwest::cookie::CookieStore`]. reqwest feeds every `Set-Cookie` header
//! into it and asks it for the `Cookie` header of each request, and the
//! authenticator can snapshot it for persistence.
//!
//! Domains follow the usual cookie-file convention: a leading `.` means the
//! cookie also applies to subdomains, a bare host means host-only.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use reqwest::header::HeaderValue;
use time::OffsetDateTime;
use time::macros::datetime;
use tracing::{debug, trace};
use url::Url;

/// A single session cookie.
///
/// The value is redacted in `Debug` output; cookie values are credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieRecord {
    /// Cookie name.
    pub name: String,
    /// Domain scope (`.example.com` for domain cookies, `example.com` for host-only).
    pub domain: String,
    /// Path scope.
    pub path: String,
    /// Absolute expiry; `None` marks a session cookie.
    pub expires: Option<OffsetDateTime>,
    /// Only sent over https.
    pub secure: bool,
    value: String,
}

impl CookieRecord {
    /// Creates a cookie record.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
        expires: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
            expires,
            secure: false,
        }
    }

    /// Marks the record as https-only.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Returns the cookie value. Avoid logging it.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// A session cookie has no expiry and must be treated as volatile.
    #[must_use]
    pub fn is_session(&self) -> bool {
        self.expires.is_none()
    }

    /// Returns true when the record carries an expiry at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    fn key(&self) -> CookieKey {
        (
            self.domain.to_ascii_lowercase(),
            self.path.clone(),
            self.name.clone(),
        )
    }

    fn matches_url(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.secure && url.scheme() != "https" {
            return false;
        }
        domain_matches(&self.domain, host) && path_matches(&self.path, url.path())
    }
}

impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("expires", &self.expires)
            .field("secure", &self.secure)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

type CookieKey = (String, String, String);

/// Expiry used when `Max-Age` points past the representable range.
const FAR_FUTURE: OffsetDateTime = datetime!(9999-12-31 23:59:59 UTC);

/// Cookie jar owned by the session authenticator.
#[derive(Debug, Default)]
pub struct SessionJar {
    records: RwLock<BTreeMap<CookieKey, CookieRecord>>,
}

impl SessionJar {
    /// Creates an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a jar pre-populated with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = CookieRecord>) -> Self {
        let jar = Self::new();
        jar.replace_all(records);
        jar
    }

    /// Inserts or overwrites the record with the same domain, path and name.
    pub fn insert(&self, record: CookieRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.key(), record);
    }

    /// Replaces the whole jar content.
    pub fn replace_all(&self, incoming: impl IntoIterator<Item = CookieRecord>) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.clear();
        for record in incoming {
            records.insert(record.key(), record);
        }
    }

    /// Returns all unexpired records, purging expired ones.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CookieRecord> {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.retain(|_, record| !record.is_expired_at(now));
        records.values().cloned().collect()
    }

    /// Number of records currently held (expired ones included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when the jar holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies one `Set-Cookie` header received from `url`.
    pub fn apply_set_cookie(&self, raw: &str, url: &Url) {
        let Some(host) = url.host_str() else {
            return;
        };
        let parsed = match cookie::Cookie::parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "ignoring unparsable Set-Cookie header");
                return;
            }
        };

        let domain = match parsed.domain().map(|d| d.trim_start_matches('.')) {
            Some(attr) if !attr.is_empty() => {
                if !domain_matches(&format!(".{attr}"), host) {
                    debug!(cookie = parsed.name(), domain = attr, host, "rejecting cookie for foreign domain");
                    return;
                }
                format!(".{}", attr.to_ascii_lowercase())
            }
            _ => host.to_ascii_lowercase(),
        };

        let path = match parsed.path() {
            Some(path) if path.starts_with('/') => path.to_string(),
            _ => default_path(url.path()),
        };

        let now = OffsetDateTime::now_utc();
        let expires = match parsed.max_age() {
            Some(max_age) => Some(expiry_after(now, max_age)),
            None => parsed.expires().and_then(cookie::Expiration::datetime),
        };

        let record = CookieRecord::new(parsed.name(), parsed.value(), domain, path, expires)
            .with_secure(parsed.secure().unwrap_or(false));
        if record.is_expired_at(now) {
            trace!(cookie = %record.name, "Set-Cookie removes cookie");
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            records.remove(&record.key());
            return;
        }

        trace!(cookie = %record.name, domain = %record.domain, "storing cookie");
        self.insert(record);
    }

    /// Builds the `Cookie` request header value for `url`, if any cookie applies.
    #[must_use]
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let now = OffsetDateTime::now_utc();
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<&CookieRecord> = records
            .values()
            .filter(|record| !record.is_expired_at(now) && record.matches_url(url))
            .collect();
        if matching.is_empty() {
            return None;
        }
        // Longer paths first.
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Some(
            matching
                .iter()
                .map(|record| format!("{}={}", record.name, record.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl reqwest::cookie::CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                self.apply_set_cookie(raw, url);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self.cookie_header(url)?;
        HeaderValue::from_str(&header).ok()
    }
}

fn expiry_after(now: OffsetDateTime, max_age: time::Duration) -> OffsetDateTime {
    match now.checked_add(max_age) {
        Some(expires) => expires,
        None if max_age.is_negative() => OffsetDateTime::UNIX_EPOCH,
        None => FAR_FUTURE,
    }
}

fn domain_matches(cookie_domain: &str, host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let cookie_domain = cookie_domain.to_ascii_lowercase();
    match cookie_domain.strip_prefix('.') {
        Some(base) => {
            host == base
                || host
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => host == cookie_domain,
    }
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path[cookie_path.len()..].starts_with('/'))
}

fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}
