//! Authenticated fetcher: routes one URL to the right client and streams the
//! body to disk.
//!
//! Requests to the gated host go through the [`SessionAuthenticator`]'s
//! client; everything else uses a plain client without cookies. A 401 or 403
//! from the gated host triggers one forced re-login and exactly one retry.
//!
//! A [`CancellationToken`] is observed while the request is in flight and
//! between body chunks; a cancelled fetch removes its partial file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::SESSION_EXPIRED_STATUSES;
use super::error::DownloadError;
use super::filename::{filename_from_url, partial_path};
use crate::auth::SessionAuthenticator;

/// What a fetch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was written to `path`.
    Downloaded {
        /// Destination file.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// `path` already existed and overwriting was off; no request was made.
    SkippedExisting {
        /// Existing destination file.
        path: PathBuf,
    },
}

impl FetchOutcome {
    /// Destination path in either case.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded { path, .. } | Self::SkippedExisting { path } => path,
        }
    }
}

/// Fetches URLs to a destination directory, logging in to the gated host as
/// needed.
#[derive(Debug, Clone)]
pub struct AuthenticatedFetcher {
    plain: Client,
    session: Arc<SessionAuthenticator>,
}

impl AuthenticatedFetcher {
    /// Creates a fetcher from a plain client and the shared authenticator.
    #[must_use]
    pub fn new(plain: Client, session: Arc<SessionAuthenticator>) -> Self {
        Self { plain, session }
    }

    /// The shared authenticator.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionAuthenticator> {
        &self.session
    }

    /// Downloads `url` into `dest_dir` and returns the destination path.
    ///
    /// See [`Self::fetch_with_outcome`].
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] as described there.
    pub async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, DownloadError> {
        self.fetch_with_outcome(url, dest_dir, overwrite)
            .await
            .map(|outcome| match outcome {
                FetchOutcome::Downloaded { path, .. } | FetchOutcome::SkippedExisting { path } => {
                    path
                }
            })
    }

    /// Downloads `url` into `dest_dir`, reporting whether anything was
    /// transferred.
    ///
    /// Equivalent to [`Self::fetch_cancellable`] with a token that is never
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] as described there.
    pub async fn fetch_with_outcome(
        &self,
        url: &str,
        dest_dir: &Path,
        overwrite: bool,
    ) -> Result<FetchOutcome, DownloadError> {
        self.fetch_cancellable(url, dest_dir, overwrite, &CancellationToken::new())
            .await
    }

    /// Downloads `url` into `dest_dir`, giving up as soon as `cancel` fires.
    ///
    /// An existing file is returned untouched when `overwrite` is false, and
    /// deleted before the request when it is true. The body is streamed into a
    /// hidden `.part` sibling and renamed into place once complete.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidUrl`] when `url` does not parse
    /// - [`DownloadError::Io`] for directory or file failures
    /// - [`DownloadError::Network`] / [`DownloadError::Timeout`] for transport
    ///   failures
    /// - [`DownloadError::HttpStatus`] for a non-success response
    /// - [`DownloadError::Login`] when the forced re-login fails
    /// - [`DownloadError::AuthRequired`] when the retry is refused again
    /// - [`DownloadError::Cancelled`] when `cancel` fires before the file is
    ///   in place
    #[instrument(skip(self, cancel), fields(dest = %dest_dir.display()))]
    pub async fn fetch_cancellable(
        &self,
        url: &str,
        dest_dir: &Path,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| DownloadError::io(dest_dir, e))?;

        let destination = dest_dir.join(filename_from_url(&parsed));
        if tokio::fs::try_exists(&destination)
            .await
            .map_err(|e| DownloadError::io(&destination, e))?
        {
            if !overwrite {
                info!(path = %destination.display(), "file exists, skipping (overwrite disabled)");
                return Ok(FetchOutcome::SkippedExisting { path: destination });
            }
            debug!(path = %destination.display(), "removing existing file before download");
            tokio::fs::remove_file(&destination)
                .await
                .map_err(|e| DownloadError::io(&destination, e))?;
        }

        info!(url, path = %destination.display(), "downloading");
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(url, "download cancelled before response");
                return Err(DownloadError::cancelled(url));
            }
            response = self.request(&parsed, url) => response?,
        };

        let bytes = write_atomically(response, url, &destination, cancel).await?;
        info!(path = %destination.display(), bytes, "download complete");
        Ok(FetchOutcome::Downloaded {
            path: destination,
            bytes,
        })
    }

    /// Sends the GET through the right client and handles the one re-login
    /// retry. Returns a response with a success status.
    async fn request(&self, parsed: &Url, url: &str) -> Result<Response, DownloadError> {
        let gated = self.session.config().is_gated_url(parsed);
        let client = if gated {
            self.session
                .authenticated_client()
                .await
                .map_err(|e| DownloadError::login(url, e))?
        } else {
            self.plain.clone()
        };

        let response = send_get(&client, parsed, url).await?;
        let status = response.status().as_u16();
        if !(gated && SESSION_EXPIRED_STATUSES.contains(&status)) {
            return require_success(response, url);
        }

        warn!(status, "access denied; refreshing session and retrying once");
        drop(response);
        self.session
            .force_login()
            .await
            .map_err(|e| DownloadError::login(url, e))?;
        let retry_client = self
            .session
            .authenticated_client()
            .await
            .map_err(|e| DownloadError::login(url, e))?;
        let retry = send_get(&retry_client, parsed, url).await?;
        let retry_status = retry.status().as_u16();
        if SESSION_EXPIRED_STATUSES.contains(&retry_status) {
            return Err(DownloadError::auth_required(url, retry_status));
        }
        require_success(retry, url)
    }
}

async fn send_get(client: &Client, parsed: &Url, url: &str) -> Result<Response, DownloadError> {
    // send() resolves once headers arrive; the body is pulled later as a stream.
    client
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| DownloadError::network(url, e))
}

fn require_success(response: Response, url: &str) -> Result<Response, DownloadError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DownloadError::http_status(url, status.as_u16()))
    }
}

async fn write_atomically(
    response: Response,
    url: &str,
    destination: &Path,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let partial = partial_path(destination);
    let result = async {
        let mut file = File::create(&partial)
            .await
            .map_err(|e| DownloadError::io(&partial, e))?;
        let bytes = stream_to_file(&mut file, response, url, &partial, cancel).await?;
        file.sync_all()
            .await
            .map_err(|e| DownloadError::io(&partial, e))?;
        drop(file);
        tokio::fs::rename(&partial, destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;
        Ok::<u64, DownloadError>(bytes)
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&partial).await;
    }
    result
}

async fn stream_to_file(
    file: &mut File,
    response: Response,
    url: &str,
    file_path: &Path,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(url, bytes_written, "download cancelled mid-body");
                return Err(DownloadError::cancelled(url));
            }
            next = stream.next() => next,
        };
        let Some(chunk_result) = next else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
