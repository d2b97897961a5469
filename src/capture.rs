//! The slide capture state machine.
//!
//! [`SlideCaptureController`] owns the baseline for exactly one video. For
//! every visited frame it samples the regions, asks the
//! [`ChangeDetector`] for a decision, hands triggered frames to a
//! [`SlideSink`], and then replaces the baseline with the frame it just
//! sampled, whether or not it triggered. Detection is therefore always
//! relative to the previous *visited* frame.
//!
//! ```text
//!   Uninitialized --(first sampleable frame)--> Ready --(every frame)--> Ready
//! ```
//!
//! Frames below the minimum size are skipped without touching the state.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs,
    path::PathBuf,
    sync::Arc,
};

use image::DynamicImage;

use crate::{
    configuration::{DetectionOptions, OutputOptions},
    detector::{ChangeDetector, ChangeEvent, Detection},
    error::SlideError,
    frame_source::FrameSource,
    naming::slide_file_name,
    progress::ProgressTracker,
    region::{RegionSampler, RegionSamples},
    stepper::{FrameStepper, Step},
};

/// Whether a baseline has been stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No frame has been sampled yet.
    Uninitialized,
    /// A baseline is present.
    Ready,
}

/// A visited frame that was judged to be a new slide and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedSlide {
    /// Label derived from the source video's name.
    pub label: String,
    /// 1-based capture number within the video.
    pub sequence: u32,
    /// Index of the frame in the video.
    pub frame_index: u64,
    /// Where the image was written.
    pub path: PathBuf,
    /// The comparison that triggered the capture.
    pub event: ChangeEvent,
}

/// What happened to one visited frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// The frame was too small to sample; nothing changed.
    Skipped,
    /// The frame became the first baseline.
    Initialized,
    /// Compared, did not trigger.
    Unchanged(ChangeEvent),
    /// Compared, triggered, and persisted as the given slide.
    Captured(CapturedSlide),
    /// Compared and triggered, but persisting the image failed.
    PersistFailed(ChangeEvent),
}

/// Persists captured frames.
pub trait SlideSink {
    /// Store `frame` as slide `sequence` of the video labelled `label` and
    /// return where it went.
    fn persist(
        &mut self,
        label: &str,
        sequence: u32,
        frame: &DynamicImage,
    ) -> Result<PathBuf, SlideError>;
}

/// Writes slides as image files into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    output: OutputOptions,
}

impl DirectorySink {
    /// Write according to `output`.
    pub fn new(output: &OutputOptions) -> Self {
        Self {
            output: output.clone(),
        }
    }
}

impl SlideSink for DirectorySink {
    fn persist(
        &mut self,
        label: &str,
        sequence: u32,
        frame: &DynamicImage,
    ) -> Result<PathBuf, SlideError> {
        let path = self.output.directory.join(slide_file_name(
            label,
            sequence,
            &self.output.image_extension,
        ));
        let write_error = |reason: String| SlideError::ImageWrite {
            path: path.clone(),
            reason,
        };

        if !self.output.directory.exists() {
            fs::create_dir_all(&self.output.directory)
                .map_err(|error| write_error(error.to_string()))?;
            log::info!("Created output directory {}", self.output.directory.display());
        }

        if path.exists() && !self.output.overwrite {
            return Err(write_error("file already exists".to_string()));
        }

        // JPEG has no alpha channel.
        frame
            .to_rgb8()
            .save(&path)
            .map_err(|error| write_error(error.to_string()))?;
        Ok(path)
    }
}

/// Sees every visited frame, e.g. to drive a live preview.
///
/// Observers cannot influence the capture.
pub trait FrameObserver: Send + Sync {
    /// Called once per visited frame. `event` is `None` for frames that were
    /// skipped or only initialised the baseline.
    fn on_frame(&self, frame_index: u64, frame: &DynamicImage, event: Option<&ChangeEvent>);
}

/// Baseline, sequence counter and captured slides for one video.
///
/// Create one per video and drop it when the video is done; it is never
/// shared between videos.
pub struct SlideCaptureController {
    sampler: RegionSampler,
    detector: ChangeDetector,
    label: String,
    baseline: Option<RegionSamples>,
    next_sequence: u32,
    slides: Vec<CapturedSlide>,
    observer: Option<Arc<dyn FrameObserver>>,
    progress: Option<ProgressTracker>,
}

impl Debug for SlideCaptureController {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SlideCaptureController")
            .field("label", &self.label)
            .field("state", &self.state())
            .field("next_sequence", &self.next_sequence)
            .field("slides", &self.slides.len())
            .field("has_observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl SlideCaptureController {
    /// A fresh controller for the video labelled `label`.
    pub fn new(label: impl Into<String>, options: &DetectionOptions) -> Self {
        Self {
            sampler: RegionSampler::new(options),
            detector: ChangeDetector::new(options),
            label: label.into(),
            baseline: None,
            next_sequence: 1,
            slides: Vec::new(),
            observer: None,
            progress: None,
        }
    }

    /// Attach an observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn FrameObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub(crate) fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = Some(tracker);
        self
    }

    /// Current state.
    pub fn state(&self) -> CaptureState {
        if self.baseline.is_some() {
            CaptureState::Ready
        } else {
            CaptureState::Uninitialized
        }
    }

    /// The stored baseline, if any.
    pub fn baseline(&self) -> Option<&RegionSamples> {
        self.baseline.as_ref()
    }

    /// Slides captured so far, in capture order.
    pub fn slides(&self) -> &[CapturedSlide] {
        &self.slides
    }

    /// Run one state-machine step for the frame at `frame_index`.
    pub fn visit<K: SlideSink + ?Sized>(
        &mut self,
        frame_index: u64,
        frame: &DynamicImage,
        sink: &mut K,
    ) -> Visit {
        let samples = match self.sampler.sample(frame) {
            Ok(samples) => samples,
            Err(error) => {
                log::warn!("{}: skipping frame {frame_index}: {error}", self.label);
                self.notify(frame_index, frame, None);
                return Visit::Skipped;
            }
        };

        let event = match self.detector.detect(&samples, self.baseline.as_ref()) {
            Detection::InitializeOnly => {
                log::debug!("{}: baseline initialised at frame {frame_index}", self.label);
                self.baseline = Some(samples);
                self.notify(frame_index, frame, None);
                return Visit::Initialized;
            }
            Detection::Compared(event) => event,
        };

        log::debug!(
            "{}: frame {frame_index}: region A {} px, region B {} px, triggered: {}",
            self.label,
            event.region_a_pixels,
            event.region_b_pixels,
            event.triggered,
        );

        let visit = if event.triggered {
            self.capture(frame_index, frame, event, sink)
        } else {
            Visit::Unchanged(event)
        };

        self.baseline = Some(samples);
        self.notify(frame_index, frame, Some(&event));
        visit
    }

    /// Visit frames of `source` until the stepper reports exhaustion or the
    /// stream ends, and return the captured slides.
    ///
    /// Unreadable frames are skipped and a failed seek ends the run; both
    /// are logged. Nothing here aborts with an error.
    pub fn run<S, K>(
        mut self,
        source: &mut S,
        stepper: &FrameStepper,
        sink: &mut K,
    ) -> Vec<CapturedSlide>
    where
        S: FrameSource + ?Sized,
        K: SlideSink + ?Sized,
    {
        loop {
            match source.read_frame() {
                Ok(Some(frame)) => {
                    let frame_index = source.position().saturating_sub(1);
                    self.visit(frame_index, &frame, sink);
                    let captured = self.slides.len() as u64;
                    if let Some(tracker) = self.progress.as_mut() {
                        tracker.advance(frame_index, captured);
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    log::warn!(
                        "{}: skipping unreadable frame at {}: {error}",
                        self.label,
                        source.position()
                    );
                }
            }

            match stepper.advance(source) {
                Ok(Step::Continue(_)) => {}
                Ok(Step::Exhausted) => break,
                Err(error) => {
                    log::warn!("{}: seek failed, ending video early: {error}", self.label);
                    break;
                }
            }
        }

        self.finish()
    }

    /// Drop the baseline and return the slides in capture order.
    pub fn finish(mut self) -> Vec<CapturedSlide> {
        let captured = self.slides.len() as u64;
        if let Some(tracker) = self.progress.as_mut() {
            tracker.finish(captured);
        }
        log::info!("{}: captured {captured} slide(s)", self.label);
        self.slides
    }

    fn capture<K: SlideSink + ?Sized>(
        &mut self,
        frame_index: u64,
        frame: &DynamicImage,
        event: ChangeEvent,
        sink: &mut K,
    ) -> Visit {
        let sequence = self.next_sequence;
        match sink.persist(&self.label, sequence, frame) {
            Ok(path) => {
                log::info!(
                    "{}: slide {sequence} at frame {frame_index} -> {}",
                    self.label,
                    path.display()
                );
                self.next_sequence += 1;
                let slide = CapturedSlide {
                    label: self.label.clone(),
                    sequence,
                    frame_index,
                    path,
                    event,
                };
                self.slides.push(slide.clone());
                Visit::Captured(slide)
            }
            Err(error) => {
                log::warn!(
                    "{}: could not save slide at frame {frame_index}: {error}",
                    self.label
                );
                Visit::PersistFailed(event)
            }
        }
    }

    fn notify(&self, frame_index: u64, frame: &DynamicImage, event: Option<&ChangeEvent>) {
        if let Some(observer) = &self.observer {
            observer.on_frame(frame_index, frame, event);
        }
    }
}
