//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressSink`] for observing pipeline progress,
//! [`CancellationToken`] for cooperative cancellation, and [`Progress`] for
//! individual progress snapshots.
//!
//! Progress is *pushed* to a caller-supplied sink; the pipelines never write
//! progress to storage or a UI themselves. Sinks are infallible — they
//! observe but cannot halt the operation. Use [`CancellationToken`] for
//! cooperative cancellation.
//!
//! # Example
//!
//! ```
//! use framepipe::{Progress, ProgressSink};
//!
//! struct PrintProgress;
//!
//! impl ProgressSink for PrintProgress {
//!     fn on_progress(&self, progress: &Progress) {
//!         println!("{}% after {:?}", progress.percent, progress.elapsed);
//!     }
//! }
//! ```

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// A snapshot of pipeline progress.
///
/// Emitted at least once per processed frame and once at completion.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Completion percentage, 0–100, monotonically non-decreasing within one
    /// run.
    pub percent: u8,
    /// Optional human-readable status message.
    pub message: Option<String>,
    /// Location of the output produced so far, if any.
    pub output: Option<PathBuf>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates from a pipeline.
///
/// Implementations must be [`Send`] and [`Sync`] because updates are emitted
/// from the drain loop's dedicated thread.
pub trait ProgressSink: Send + Sync {
    /// Called for every progress snapshot the pipeline emits.
    fn on_progress(&self, progress: &Progress);
}

/// A no-op sink that discards all progress notifications.
///
/// This is the default when no sink is configured.
pub struct NoOpProgress;

impl ProgressSink for NoOpProgress {
    fn on_progress(&self, _progress: &Progress) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to request
/// cancellation. The flag is write-once-to-true: both drain loops check
/// [`is_cancelled`](CancellationToken::is_cancelled) once per loop iteration
/// and stop within one iteration once it is set.
///
/// # Example
///
/// ```
/// use framepipe::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal helper that stamps elapsed time and keeps the reported
/// percentage monotone within one run.
pub(crate) struct ProgressTracker {
    sink: Arc<dyn ProgressSink>,
    start_time: Instant,
    highest_percent: u8,
}

impl ProgressTracker {
    pub(crate) fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            start_time: Instant::now(),
            highest_percent: 0,
        }
    }

    /// Emit one snapshot. `percent` is clamped to 0–100 and never reported
    /// lower than a previously reported value.
    pub(crate) fn emit(
        &mut self,
        percent: u8,
        message: Option<String>,
        output: Option<PathBuf>,
    ) {
        self.highest_percent = self.highest_percent.max(percent.min(100));
        let progress = Progress {
            percent: self.highest_percent,
            message,
            output,
            elapsed: self.start_time.elapsed(),
        };
        self.sink.on_progress(&progress);
    }
}
