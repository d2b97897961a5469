//! Batch processing.
//!
//! [`process_video`] runs the whole pipeline for one file: open, capture,
//! assemble. [`Batch`] does that for every file in a directory, oldest
//! modification time first. A video that cannot be opened, or whose outputs
//! already exist while overwriting is disabled, is logged and skipped; a
//! document that cannot be written is logged and recorded in the report;
//! neither stops the batch.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use crate::{
    capture::{CapturedSlide, DirectorySink, SlideCaptureController, SlideSink},
    configuration::CaptureOptions,
    document::{DocumentAssembler, DocumentSummary},
    error::SlideError,
    frame_source::{FrameSource, VideoSource},
    naming::{document_path, existing_slides, label_for_path},
    progress::ProgressTracker,
    stepper::FrameStepper,
    video::VideoFile,
};

/// Result of processing one video end to end.
#[derive(Debug, Clone)]
pub struct VideoReport {
    /// The processed video.
    pub source: VideoSource,
    /// Slides captured, in capture order.
    pub slides: Vec<CapturedSlide>,
    /// The written document, `None` if writing it failed.
    pub document: Option<DocumentSummary>,
    /// Why the document could not be written, if it failed.
    pub document_error: Option<String>,
}

/// What became of one file in a batch.
#[derive(Debug, Clone)]
pub enum VideoOutcome {
    /// The video was processed.
    Completed(VideoReport),
    /// The file could not be opened as a video, or its outputs already
    /// exist and may not be overwritten.
    Skipped {
        /// The file.
        path: PathBuf,
        /// Why it was skipped.
        reason: String,
    },
}

impl VideoOutcome {
    /// Path of the file this outcome is about.
    pub fn path(&self) -> &Path {
        match self {
            VideoOutcome::Completed(report) => &report.source.path,
            VideoOutcome::Skipped { path, .. } => path,
        }
    }
}

/// Outcomes of a batch, in processing order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One entry per file that was attempted.
    pub outcomes: Vec<VideoOutcome>,
    /// `true` if the batch stopped early because of cancellation.
    pub cancelled: bool,
}

impl BatchReport {
    /// Total slides captured across all videos.
    pub fn slide_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                VideoOutcome::Completed(report) => report.slides.len(),
                VideoOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    /// Number of documents written.
    pub fn document_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| {
                matches!(outcome, VideoOutcome::Completed(report) if report.document.is_some())
            })
            .count()
    }
}

/// Run the capture loop over any frame source, writing slides to `sink`.
///
/// This is the detection core without file handling: one fresh controller,
/// one stepper, one pass over the source.
pub fn capture_slides<S, K>(
    source: &mut S,
    label: &str,
    options: &CaptureOptions,
    sink: &mut K,
) -> Result<Vec<CapturedSlide>, SlideError>
where
    S: FrameSource + ?Sized,
    K: SlideSink + ?Sized,
{
    options.validate()?;
    let stepper = FrameStepper::fixed(options.stepping.skip);
    Ok(controller_for(label, options).run(source, &stepper, sink))
}

fn controller_for(label: &str, options: &CaptureOptions) -> SlideCaptureController {
    let controller = SlideCaptureController::new(label, &options.detection);
    match &options.observer {
        Some(observer) => controller.with_observer(observer.clone()),
        None => controller,
    }
}

/// Capture slides from the already opened `frames` of `source` into the
/// output directory and assemble its document. Document failures are
/// recorded in the report, not returned.
///
/// # Errors
///
/// Invalid options, or [`SlideError::OutputExists`] when overwriting is
/// disabled and slides or the document of this video are already present.
/// Nothing is captured in that case.
pub fn process_source<S: FrameSource + ?Sized>(
    frames: &mut S,
    source: VideoSource,
    options: &CaptureOptions,
) -> Result<VideoReport, SlideError> {
    options.validate()?;
    let label = label_for_path(&source.path);
    let output = document_path(&options.output.directory, &source.path);
    if !options.output.overwrite {
        let existing = existing_slides(
            &options.output.directory,
            &label,
            &options.output.image_extension,
        )
        .into_iter()
        .next()
        .or_else(|| output.exists().then(|| output.clone()));
        if let Some(path) = existing {
            return Err(SlideError::OutputExists { path });
        }
    }
    log::info!(
        "Processing {} (label {label}, {} frames)",
        source.path.display(),
        source
            .frame_count
            .map_or_else(|| "unknown".to_string(), |count| count.to_string()),
    );

    let stepper = FrameStepper::fixed(options.stepping.skip);
    let controller = controller_for(&label, options).with_progress(ProgressTracker::new(
        options.progress.clone(),
        &source.path,
        source.frame_count,
    ));

    let mut sink = DirectorySink::new(&options.output);
    let slides = controller.run(frames, &stepper, &mut sink);

    let images: Vec<PathBuf> = slides.iter().map(|slide| slide.path.clone()).collect();
    let (document, document_error) =
        match DocumentAssembler::new(options.page).write(&images, &output) {
            Ok(summary) => (Some(summary), None),
            Err(error) => {
                log::warn!("Failed to write document {}: {error}", output.display());
                (None, Some(error.to_string()))
            }
        };

    Ok(VideoReport {
        source,
        slides,
        document,
        document_error,
    })
}

/// Open `path` and run the full pipeline on it.
///
/// # Errors
///
/// Invalid options, or a video that cannot be opened. Failures after the
/// video is open are contained in the returned [`VideoReport`].
pub fn process_video<P: AsRef<Path>>(
    path: P,
    options: &CaptureOptions,
) -> Result<VideoReport, SlideError> {
    options.validate()?;
    let mut video = VideoFile::open(path)?;
    let source = video.source().clone();
    process_source(&mut video, source, options)
}

/// Every video in one directory, processed oldest first.
#[derive(Debug, Clone)]
pub struct Batch {
    input_directory: PathBuf,
    options: CaptureOptions,
}

impl Batch {
    /// Process the files of `input_directory` with `options`.
    pub fn new<P: AsRef<Path>>(input_directory: P, options: CaptureOptions) -> Self {
        Self {
            input_directory: input_directory.as_ref().to_path_buf(),
            options,
        }
    }

    /// Regular files of the input directory, by ascending modification time
    /// (ties broken by name).
    pub fn videos(&self) -> Result<Vec<PathBuf>, SlideError> {
        let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.input_directory)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, entry.path()));
        }
        files.sort();
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Process every video in order.
    ///
    /// # Errors
    ///
    /// Invalid options, or an unreadable input directory. Per-video failures
    /// are reported in the [`BatchReport`].
    pub fn run(&self) -> Result<BatchReport, SlideError> {
        self.options.validate()?;
        let mut report = BatchReport::default();

        for path in self.videos()? {
            if self.options.is_cancelled() {
                log::info!("Batch cancelled before {}", path.display());
                report.cancelled = true;
                break;
            }
            report.outcomes.push(self.process(path));
        }

        Ok(report)
    }

    /// Process the videos on the rayon thread pool.
    ///
    /// Each video still has its own controller and baseline, and slide
    /// names are unique per video, so the shared output directory is the
    /// only common state. Outcomes keep modification-time order.
    #[cfg(feature = "rayon")]
    pub fn run_parallel(&self) -> Result<BatchReport, SlideError> {
        use rayon::prelude::*;

        self.options.validate()?;
        let outcomes: Vec<Option<VideoOutcome>> = self
            .videos()?
            .into_par_iter()
            .map(|path| {
                if self.options.is_cancelled() {
                    None
                } else {
                    Some(self.process(path))
                }
            })
            .collect();

        let cancelled = outcomes.iter().any(Option::is_none);
        Ok(BatchReport {
            outcomes: outcomes.into_iter().flatten().collect(),
            cancelled,
        })
    }

    fn process(&self, path: PathBuf) -> VideoOutcome {
        match process_video(&path, &self.options) {
            Ok(report) => VideoOutcome::Completed(report),
            Err(error) => {
                log::warn!("Skipping {}: {error}", path.display());
                VideoOutcome::Skipped {
                    path,
                    reason: error.to_string(),
                }
            }
        }
    }
}
