//! Progress reporting for batch imports.

/// Receives batch progress as a percentage in `0.0..=100.0`.
pub trait ProgressSink: Send + Sync {
    /// Reports the current completion percentage.
    fn report(&self, percent: f64);
}

/// Discards progress reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _percent: f64) {}
}
