//! Progress bar for batch runs.

use indicatif::{ProgressBar, ProgressStyle};
use url_importer::ProgressSink;

/// Renders batch progress as a percentage bar on stderr.
pub(crate) struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub(crate) fn new(total_urls: usize) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(format!("{total_urls} URL(s)"));
        Self { bar }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ProgressBarSink {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn report(&self, percent: f64) {
        self.bar.set_position(percent.clamp(0.0, 100.0).round() as u64);
    }
}
