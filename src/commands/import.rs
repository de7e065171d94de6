//! Batch import command: download the configured URLs.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url_importer::download::build_plain_client;
use url_importer::{
    AuthenticatedFetcher, ClientSettings, ImporterConfig, LibraryNotifier, LogNotifier,
    MediaServerNotifier, NoopProgress, run_import,
};

use super::build_authenticator;
use crate::cli::ImportArgs;
use crate::progress_bar::ProgressBarSink;
use crate::{ProcessExit, exit_handler, terminal};

/// Applies command-line overrides on top of the file configuration.
pub(crate) fn apply_overrides(mut config: ImporterConfig, args: &ImportArgs) -> ImporterConfig {
    if let Some(dest) = &args.dest {
        config.destination_folder.clone_from(dest);
    }
    if args.overwrite {
        config.overwrite_if_exists = true;
    }
    if args.no_scan {
        config.trigger_library_scan = false;
    }
    if !args.urls.is_empty() {
        config.urls.clone_from(&args.urls);
    }
    config
}

pub async fn run_import_command(
    config: ImporterConfig,
    args: &ImportArgs,
    quiet: bool,
) -> Result<ProcessExit> {
    let config = apply_overrides(config, args);
    config.validate()?;
    config.require_destination()?;

    let settings = ClientSettings::from_config(&config);
    let plain = build_plain_client(settings).context("Failed to build HTTP client")?;
    let fetcher = AuthenticatedFetcher::new(plain.clone(), build_authenticator(&config)?);

    let notifier: Box<dyn LibraryNotifier> = match config.library_scan_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Box::new(MediaServerNotifier::new(
            plain,
            url,
            config.library_api_key.clone(),
        )),
        _ => Box::new(LogNotifier),
    };

    let interrupted = CancellationToken::new();
    let interrupted_signal = interrupted.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping the current download");
            interrupted_signal.cancel();
        }
    });

    let use_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );

    info!(urls = config.urls.len(), dest = %config.destination_folder.display(), "Import starting");
    let report = if use_bar {
        let bar = ProgressBarSink::new(config.urls.len());
        let report = run_import(&config, &fetcher, &bar, notifier.as_ref(), &interrupted).await;
        bar.finish();
        report
    } else {
        run_import(&config, &fetcher, &NoopProgress, notifier.as_ref(), &interrupted).await
    }?;

    for failure in &report.failures {
        warn!(url = %failure.url, error = %failure.error, "Failed");
    }
    if report.cancelled {
        warn!(
            completed = report.succeeded(),
            total = config.urls.len(),
            "Interrupted. Run again to continue; existing files are skipped."
        );
    }

    Ok(exit_handler::exit_for_report(&report))
}
