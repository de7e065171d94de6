//! Batch import: fetch the configured URLs and tell the media library.

mod notify;
mod orchestrator;
mod progress;

pub use notify::{
    LibraryNotifier, LogNotifier, MEDIA_SERVER_TOKEN_HEADER, MediaServerNotifier, NotifyError,
};
pub use orchestrator::{ImportError, ImportReport, ItemFailure, run_import};
pub use progress::{NoopProgress, ProgressSink};
