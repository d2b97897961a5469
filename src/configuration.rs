//! Capture configuration.
//!
//! Every constant the slide detector depends on lives here as a named,
//! overridable field: the two regions of interest, the per-region pixel
//! thresholds, the intensity cutoff, the minimum frame size, the frame skip
//! and the page layout of the output document. Defaults reproduce the
//! lecture-capture layout the detector was tuned for.
//!
//! # Example
//!
//! ```
//! use slidegrab::{CaptureOptions, DetectionOptions, Region, SteppingOptions};
//!
//! let detection = DetectionOptions::new()
//!     .with_region_a(Region::from_bounds(400..600, 1000..1200))
//!     .with_intensity_threshold(40);
//! let options = CaptureOptions::new("slides")
//!     .with_detection(detection)
//!     .with_stepping(SteppingOptions::new().with_skip(50));
//! assert!(options.validate().is_ok());
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    ops::Range,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    capture::FrameObserver,
    error::SlideError,
    progress::{CancellationToken, NoOpProgress, ProgressCallback},
};

/// A fixed rectangle of a frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// First row of the rectangle.
    pub top: u32,
    /// First column of the rectangle.
    pub left: u32,
    /// Number of rows.
    pub height: u32,
    /// Number of columns.
    pub width: u32,
}

impl Region {
    /// Create a region from its top-left corner and size.
    pub const fn new(top: u32, left: u32, height: u32, width: u32) -> Self {
        Self {
            top,
            left,
            height,
            width,
        }
    }

    /// Create a region from half-open row and column ranges.
    ///
    /// An inverted range produces an empty region, which
    /// [`DetectionOptions::validate`] rejects.
    pub fn from_bounds(rows: Range<u32>, columns: Range<u32>) -> Self {
        Self {
            top: rows.start,
            left: columns.start,
            height: rows.end.saturating_sub(rows.start),
            width: columns.end.saturating_sub(columns.start),
        }
    }

    /// One past the last row.
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    /// One past the last column.
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// `true` if the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `true` if the region lies entirely inside a `width` x `height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Region placement, thresholds and frame-size precondition for the
/// change detector.
///
/// A visited frame triggers a capture when
/// `(diff_a > region_a_threshold && diff_b > region_b_threshold)
/// || diff_a > region_a_strong_threshold || diff_b > region_b_strong_threshold`,
/// where `diff_*` counts pixels whose grayscale difference against the
/// baseline exceeds `intensity_threshold`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct DetectionOptions {
    /// Region A (the slide-number indicator in the reference layout).
    pub region_a: Region,
    /// Region B (the content thumbnail in the reference layout).
    pub region_b: Region,
    /// Per-pixel absolute difference above which a pixel counts as changed.
    pub intensity_threshold: u8,
    /// Joint threshold for region A.
    pub region_a_threshold: u64,
    /// Joint threshold for region B.
    pub region_b_threshold: u64,
    /// Region A count that triggers on its own.
    pub region_a_strong_threshold: u64,
    /// Region B count that triggers on its own.
    pub region_b_strong_threshold: u64,
    /// Frames narrower than this are never sampled.
    pub min_width: u32,
    /// Frames shorter than this are never sampled.
    pub min_height: u32,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            region_a: Region::from_bounds(480..660, 1060..1200),
            region_b: Region::from_bounds(280..500, 340..540),
            intensity_threshold: 30,
            region_a_threshold: 100,
            region_b_threshold: 300,
            region_a_strong_threshold: 150,
            region_b_strong_threshold: 1000,
            min_width: 1280,
            min_height: 720,
        }
    }
}

impl DetectionOptions {
    /// Create detection options with the reference layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace region A.
    pub fn with_region_a(mut self, region: Region) -> Self {
        self.region_a = region;
        self
    }

    /// Replace region B.
    pub fn with_region_b(mut self, region: Region) -> Self {
        self.region_b = region;
        self
    }

    /// Set the per-pixel intensity cutoff (0-255).
    pub fn with_intensity_threshold(mut self, threshold: u8) -> Self {
        self.intensity_threshold = threshold;
        self
    }

    /// Set the joint thresholds for regions A and B.
    pub fn with_joint_thresholds(mut self, region_a: u64, region_b: u64) -> Self {
        self.region_a_threshold = region_a;
        self.region_b_threshold = region_b;
        self
    }

    /// Set the unilateral thresholds for regions A and B.
    pub fn with_strong_thresholds(mut self, region_a: u64, region_b: u64) -> Self {
        self.region_a_strong_threshold = region_a;
        self.region_b_strong_threshold = region_b;
        self
    }

    /// Set the minimum frame size that will be sampled.
    pub fn with_min_dimensions(mut self, width: u32, height: u32) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    /// Check that both regions are non-empty and fit inside the minimum
    /// frame, so that any frame passing the size check can be sampled.
    pub fn validate(&self) -> Result<(), SlideError> {
        for (name, region) in [("A", &self.region_a), ("B", &self.region_b)] {
            if region.is_empty() {
                return Err(SlideError::InvalidRegion {
                    name,
                    reason: "region covers no pixels".to_string(),
                });
            }
            if !region.fits_within(self.min_width, self.min_height) {
                return Err(SlideError::InvalidRegion {
                    name,
                    reason: format!(
                        "rows {}..{} / columns {}..{} exceed the minimum frame {}x{}",
                        region.top,
                        region.bottom(),
                        region.left,
                        region.right(),
                        self.min_width,
                        self.min_height,
                    ),
                });
            }
        }
        Ok(())
    }
}

/// How far the read position jumps after every visited frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SteppingOptions {
    /// Frames skipped between two visited frames. Default: 100.
    pub skip: u64,
}

impl Default for SteppingOptions {
    fn default() -> Self {
        Self { skip: 100 }
    }
}

impl SteppingOptions {
    /// Create stepping options with the default skip.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of frames skipped between visits.
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Reject a zero skip.
    pub fn validate(&self) -> Result<(), SlideError> {
        if self.skip == 0 {
            return Err(SlideError::InvalidSkip);
        }
        Ok(())
    }
}

/// Page orientation of the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrientation {
    /// Long edge horizontal. This is the default.
    #[default]
    Landscape,
    /// Long edge vertical.
    Portrait,
}

/// Page format of the output document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSize {
    /// ISO A4 (210 x 297 mm). This is the default.
    #[default]
    A4,
    /// US Letter (8.5 x 11 in).
    Letter,
    /// Any size, in millimetres. Orientation decides which edge is horizontal.
    Custom {
        /// Width in portrait orientation.
        width_mm: f32,
        /// Height in portrait orientation.
        height_mm: f32,
    },
}

impl PageSize {
    /// Portrait `(width, height)` in millimetres.
    pub fn portrait_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }
}

/// How a slide is placed in the area inside the page margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFit {
    /// Fill the whole area, ignoring the slide's aspect ratio. This is the
    /// default.
    #[default]
    Stretch,
    /// Scale uniformly to fit and centre the slide.
    Contain,
}

/// Page layout of the output document.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct PageOptions {
    /// Page orientation.
    pub orientation: PageOrientation,
    /// Page format.
    pub size: PageSize,
    /// Margin on every side, in millimetres. Default: 15.
    pub margin_mm: f32,
    /// Slide placement inside the margins.
    pub fit: ImageFit,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            size: PageSize::A4,
            margin_mm: 15.0,
            fit: ImageFit::Stretch,
        }
    }
}

impl PageOptions {
    /// Create page options for landscape A4 with 15 mm margins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the orientation.
    pub fn with_orientation(mut self, orientation: PageOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the page format.
    pub fn with_size(mut self, size: PageSize) -> Self {
        self.size = size;
        self
    }

    /// Set the margin, clamped to be non-negative.
    pub fn with_margin_mm(mut self, margin_mm: f32) -> Self {
        self.margin_mm = margin_mm.max(0.0);
        self
    }

    /// Set the slide placement.
    pub fn with_fit(mut self, fit: ImageFit) -> Self {
        self.fit = fit;
        self
    }

    /// Oriented page `(width, height)` in millimetres.
    pub fn page_mm(&self) -> (f32, f32) {
        let (short, long) = {
            let (w, h) = self.size.portrait_mm();
            (w.min(h), w.max(h))
        };
        match self.orientation {
            PageOrientation::Landscape => (long, short),
            PageOrientation::Portrait => (short, long),
        }
    }
}

/// Where captured slides and documents are written.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct OutputOptions {
    /// Output directory, shared by every video of a batch.
    pub directory: PathBuf,
    /// Image extension for captured slides. Default: `jpg`.
    pub image_extension: String,
    /// Replace existing slide images and documents. When off, a video
    /// with outputs already present is skipped. Default: `true`.
    pub overwrite: bool,
}

impl OutputOptions {
    /// Write into `directory` as JPEG, overwriting existing files.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            image_extension: "jpg".to_string(),
            overwrite: true,
        }
    }

    /// Set the image extension (`jpg`, `png`, `bmp`, ...).
    pub fn with_image_extension(mut self, extension: &str) -> Self {
        self.image_extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Control whether existing files may be replaced.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Everything needed to turn one video (or a directory of videos) into
/// slide images and documents.
#[derive(Clone)]
#[must_use]
pub struct CaptureOptions {
    /// Region and threshold settings.
    pub detection: DetectionOptions,
    /// Frame skip settings.
    pub stepping: SteppingOptions,
    /// Output location settings.
    pub output: OutputOptions,
    /// Document page layout.
    pub page: PageOptions,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Checked between videos of a batch. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// Per-visited-frame observer, absent by default.
    pub(crate) observer: Option<Arc<dyn FrameObserver>>,
}

impl Debug for CaptureOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CaptureOptions")
            .field("detection", &self.detection)
            .field("stepping", &self.stepping)
            .field("output", &self.output)
            .field("page", &self.page)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl CaptureOptions {
    /// Reference settings, writing into `output_directory`.
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            detection: DetectionOptions::default(),
            stepping: SteppingOptions::default(),
            output: OutputOptions::new(output_directory),
            page: PageOptions::default(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            observer: None,
        }
    }

    /// Replace the detection settings.
    pub fn with_detection(mut self, detection: DetectionOptions) -> Self {
        self.detection = detection;
        self
    }

    /// Replace the stepping settings.
    pub fn with_stepping(mut self, stepping: SteppingOptions) -> Self {
        self.stepping = stepping;
        self
    }

    /// Replace the output settings.
    pub fn with_output(mut self, output: OutputOptions) -> Self {
        self.output = output;
        self
    }

    /// Replace the page layout.
    pub fn with_page(mut self, page: PageOptions) -> Self {
        self.page = page;
        self
    }

    /// Attach a progress callback.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Attach an observer that sees every visited frame.
    pub fn with_observer(mut self, observer: Arc<dyn FrameObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validate detection and stepping settings.
    pub fn validate(&self) -> Result<(), SlideError> {
        self.detection.validate()?;
        self.stepping.validate()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_regions() {
        let options = DetectionOptions::default();
        assert_eq!(options.region_a, Region::new(480, 1060, 180, 140));
        assert_eq!(options.region_b, Region::new(280, 340, 220, 200));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn inverted_bounds_are_empty() {
        let region = Region::from_bounds(10..5, 0..4);
        assert!(region.is_empty());

        let options = DetectionOptions::new().with_region_b(region);
        assert!(matches!(
            options.validate(),
            Err(SlideError::InvalidRegion { name: "B", .. })
        ));
    }

    #[test]
    fn region_outside_minimum_frame_is_rejected() {
        let options =
            DetectionOptions::new().with_region_a(Region::from_bounds(700..760, 0..10));
        assert!(matches!(
            options.validate(),
            Err(SlideError::InvalidRegion { name: "A", .. })
        ));
    }

    #[test]
    fn zero_skip_is_rejected() {
        assert!(matches!(
            SteppingOptions::new().with_skip(0).validate(),
            Err(SlideError::InvalidSkip)
        ));
    }

    #[test]
    fn landscape_a4_page() {
        let (width, height) = PageOptions::new().page_mm();
        assert_eq!((width, height), (297.0, 210.0));

        let (width, height) = PageOptions::new()
            .with_orientation(PageOrientation::Portrait)
            .with_size(PageSize::Letter)
            .page_mm();
        assert_eq!((width, height), (215.9, 279.4));
    }

    #[test]
    fn image_extension_is_normalised() {
        let output = OutputOptions::new("out").with_image_extension(".PNG");
        assert_eq!(output.image_extension, "png");
    }
}
