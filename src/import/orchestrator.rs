//! Batch driver: fetch every configured URL, then notify the library.

use std::path::PathBuf;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::notify::LibraryNotifier;
use super::progress::ProgressSink;
use crate::config::{ConfigError, ImporterConfig};
use crate::download::{AuthenticatedFetcher, DownloadError, FetchOutcome};

/// Errors that stop a batch before it starts.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The configuration cannot drive a batch.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One URL that failed.
#[derive(Debug)]
pub struct ItemFailure {
    /// The URL as configured.
    pub url: String,
    /// Why it failed.
    pub error: DownloadError,
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Files written in this run.
    pub downloaded: Vec<PathBuf>,
    /// Files left untouched because they already existed.
    pub skipped_existing: Vec<PathBuf>,
    /// Per-item failures.
    pub failures: Vec<ItemFailure>,
    /// The run stopped early on a cancellation request.
    pub cancelled: bool,
}

impl ImportReport {
    /// Number of items that ended with a file in place.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.downloaded.len() + self.skipped_existing.len()
    }

    /// Number of items attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded() + self.failures.len()
    }
}

/// Fetches all `config.urls` sequentially into the destination folder.
///
/// Per-item failures are logged and recorded in the report; they never stop
/// the batch. `cancel` is checked before each item and also interrupts the
/// fetch in flight; the interrupted item is not counted. After a batch that was not
/// cancelled, `notifier` is told about the destination folder when
/// `trigger_library_scan` is set, and progress reaches 100.
///
/// # Errors
///
/// Returns [`ImportError::Config`] when no destination folder is configured.
#[instrument(skip_all, fields(urls = config.urls.len()))]
pub async fn run_import(
    config: &ImporterConfig,
    fetcher: &AuthenticatedFetcher,
    progress: &dyn ProgressSink,
    notifier: &dyn LibraryNotifier,
    cancel: &CancellationToken,
) -> Result<ImportReport, ImportError> {
    let destination = config.require_destination()?;
    let mut report = ImportReport::default();

    if config.urls.is_empty() {
        info!("no URLs configured, nothing to do");
        return Ok(report);
    }

    #[allow(clippy::cast_precision_loss)]
    let step = 100.0 / (config.urls.len() + 1) as f64;
    let mut current = 0.0;

    for url in &config.urls {
        if cancel.is_cancelled() {
            return Ok(cancelled(report, config.urls.len()));
        }

        match fetcher
            .fetch_cancellable(url, destination, config.overwrite_if_exists, cancel)
            .await
        {
            Ok(FetchOutcome::Downloaded { path, .. }) => report.downloaded.push(path),
            Ok(FetchOutcome::SkippedExisting { path }) => report.skipped_existing.push(path),
            Err(DownloadError::Cancelled { .. }) => {
                return Ok(cancelled(report, config.urls.len()));
            }
            Err(e) => {
                error!(url = %url, error = %e, "download failed");
                report.failures.push(ItemFailure {
                    url: url.clone(),
                    error: e,
                });
            }
        }

        current += step;
        progress.report(current);
    }

    if config.trigger_library_scan {
        info!(folder = %destination.display(), "triggering library scan");
        if let Err(e) = notifier.directory_changed(destination).await {
            warn!(error = %e, "library scan notification failed; the server may still pick up changes on its own");
        }
    }

    progress.report(100.0);
    info!(
        downloaded = report.downloaded.len(),
        skipped = report.skipped_existing.len(),
        failed = report.failures.len(),
        "import finished"
    );
    Ok(report)
}

fn cancelled(mut report: ImportReport, total: usize) -> ImportReport {
    warn!(remaining = total - report.attempted(), "import cancelled");
    report.cancelled = true;
    report
}
