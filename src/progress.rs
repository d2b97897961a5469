//! Progress reporting and cancellation support.
//!
//! [`ProgressCallback`] observes the capture loop of each video,
//! [`ProgressInfo`] is the snapshot it receives, and [`CancellationToken`]
//! lets a caller stop a batch between two videos.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use slidegrab::{Batch, CaptureOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{}: {pct:.1}% ({} slides)", info.video.display(), info.slides_captured);
//!         }
//!     }
//! }
//!
//! let options = CaptureOptions::new("slides").with_progress(Arc::new(PrintProgress));
//! let report = Batch::new("lectures", options).run()?;
//! # Ok::<(), slidegrab::SlideError>(())
//! ```

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// A snapshot of one video's capture progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The video being processed.
    pub video: PathBuf,
    /// Frames visited so far.
    pub visited: u64,
    /// Index of the frame just visited.
    pub current_frame: u64,
    /// Total frames in the video, if known.
    pub total_frames: Option<u64>,
    /// Completion percentage (0.0 - 100.0) by frame position, if the total
    /// is known.
    pub percentage: Option<f32>,
    /// Slides captured so far in this video.
    pub slides_captured: u64,
    /// Wall-clock time since the video was opened.
    pub elapsed: Duration,
    /// Estimated time remaining, extrapolated from the frame position.
    pub estimated_remaining: Option<Duration>,
}

/// Receives progress updates from the capture loop.
///
/// Callbacks observe but cannot halt processing; use [`CancellationToken`]
/// to stop a batch.
pub trait ProgressCallback: Send + Sync {
    /// Called after every visited frame and once when a video finishes.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. This is the default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state. The batch runner checks the token before opening
/// each video; a video already in progress always runs to completion.
///
/// ```
/// use slidegrab::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
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

/// Tracks timing for one video and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    video: PathBuf,
    total_frames: Option<u64>,
    visited: u64,
    current_frame: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        video: &Path,
        total_frames: Option<u64>,
    ) -> Self {
        Self {
            callback,
            video: video.to_path_buf(),
            total_frames,
            visited: 0,
            current_frame: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one visited frame.
    pub(crate) fn advance(&mut self, frame_index: u64, slides_captured: u64) {
        self.visited += 1;
        self.current_frame = frame_index;
        self.report(slides_captured, false);
    }

    /// Emit the final report for this video.
    pub(crate) fn finish(&mut self, slides_captured: u64) {
        self.report(slides_captured, true);
    }

    fn report(&self, slides_captured: u64, finished: bool) {
        let elapsed = self.start_time.elapsed();
        let total = self.total_frames.filter(|&total| total > 0);

        let done = match total {
            Some(total) if finished => total,
            Some(total) => (self.current_frame + 1).min(total),
            None => 0,
        };

        let percentage = total.map(|total| (done as f32 / total as f32) * 100.0);

        let estimated_remaining = total.filter(|_| done > 0).map(|total| {
            let per_frame = elapsed.as_secs_f64() / done as f64;
            Duration::from_secs_f64(per_frame * total.saturating_sub(done) as f64)
        });

        let info = ProgressInfo {
            video: self.video.clone(),
            visited: self.visited,
            current_frame: self.current_frame,
            total_frames: self.total_frames,
            percentage,
            slides_captured,
            elapsed,
            estimated_remaining,
        };

        self.callback.on_progress(&info);
    }
}
