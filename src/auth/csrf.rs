//! Anti-forgery token extraction from login pages.
//!
//! Login forms usually carry a hidden input such as `csrf_token` or `_token`
//! that must be echoed back with the credentials. Only the first matching
//! hidden input in document order is used.

use std::sync::LazyLock;

use regex::Regex;

/// Name fragments that mark a hidden input as an anti-forgery token.
/// Matching is a case-sensitive substring test.
const TOKEN_NAME_MARKERS: &[&str] = &["csrf", "_token"];

static INPUT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<input\b[^>]*>"));
static INPUT_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#,
    )
});

fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// A hidden form field carrying an anti-forgery token.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfField {
    /// Input name, submitted verbatim as the form key.
    pub name: String,
    /// Input value; empty when the input has no `value` attribute.
    pub value: String,
}

impl std::fmt::Debug for CsrfField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfField")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Finds the first hidden input whose name contains `csrf` or `_token`.
#[must_use]
pub fn extract_csrf_field(html: &str) -> Option<CsrfField> {
    INPUT_TAG_RE.find_iter(html).find_map(|tag| {
        let mut input_type: Option<String> = None;
        let mut name: Option<String> = None;
        let mut value: Option<String> = None;

        for attr in INPUT_ATTR_RE.captures_iter(tag.as_str()) {
            let key = attr.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            let raw = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map_or("", |m| m.as_str());

            // First occurrence of an attribute wins, as in HTML parsing.
            match key.as_str() {
                "type" if input_type.is_none() => input_type = Some(raw.trim().to_string()),
                "name" if name.is_none() => name = Some(raw.to_string()),
                "value" if value.is_none() => value = Some(raw.to_string()),
                _ => {}
            }
        }

        let is_hidden = input_type.is_some_and(|t| t.eq_ignore_ascii_case("hidden"));
        let name = name.filter(|n| !n.is_empty())?;
        if !is_hidden || !TOKEN_NAME_MARKERS.iter().any(|marker| name.contains(marker)) {
            return None;
        }

        Some(CsrfField {
            name,
            value: value.unwrap_or_default(),
        })
    })
}
