//! Destination file names for downloads.
//!
//! The name is the last segment of the URL path, percent-decoded and made
//! filesystem-safe. URLs without a usable segment get a timestamped name.

use std::path::{Component, Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::debug;
use url::Url;

const FALLBACK_PREFIX: &str = "download_";

/// Derives the destination file name for `url`.
#[must_use]
pub fn filename_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
            debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
            last.into()
        });
        if !decoded.trim().is_empty() {
            return sanitize_filename(&decoded);
        }
    }

    timestamped_filename(OffsetDateTime::now_utc())
}

/// Builds the `download_yyyyMMdd_HHmmssfff` fallback name.
#[must_use]
pub fn timestamped_filename(at: OffsetDateTime) -> String {
    let stamp = at
        .format(format_description!(
            "[year][month][day]_[hour][minute][second][subsecond digits:3]"
        ))
        .unwrap_or_else(|_| (at.unix_timestamp_nanos() / 1_000_000).to_string());
    format!("{FALLBACK_PREFIX}{stamp}")
}

/// Path of the temporary file a download streams into before being renamed.
#[must_use]
pub fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.part"))
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
