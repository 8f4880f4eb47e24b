//! Progress reporting for mirror downloads.

/// Receives byte counts while a file is streamed to disk.
///
/// Calls happen synchronously on the downloading task after every written
/// chunk, so implementations must be cheap (update a counter, send on a
/// channel, tick a progress bar).
pub trait ProgressSink: Send + Sync {
    /// A new mirror attempt is starting. The byte count restarts at zero.
    fn on_attempt(&self, _mirror: &str, _expected_len: Option<u64>) {}

    /// Cumulative bytes written by the current attempt.
    fn on_progress(&self, bytes_so_far: u64);
}

/// Closures only see byte counts. Every mirror attempt starts with a `0`, so
/// after a mid-stream failure the sequence restarts there; use a full
/// [`ProgressSink`] implementation to be told which mirror is streaming.
impl<F> ProgressSink for F
where
    F: Fn(u64) + Send + Sync,
{
    fn on_progress(&self, bytes_so_far: u64) {
        self(bytes_so_far);
    }
}

/// Sink that ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _bytes_so_far: u64) {}
}
