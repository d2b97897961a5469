//! # slidegrab
//!
//! Pull the distinct slides out of a recorded lecture video and bind them
//! into a PDF.
//!
//! Lecture-capture recordings show the slide deck inside a fixed screen
//! layout. `slidegrab` watches two fixed regions of that layout (by default
//! a slide-number indicator and a content thumbnail), and whenever enough
//! pixels in them change between two visited frames, it saves the frame as
//! a slide. To stay fast on hour-long recordings it seeks ahead a fixed
//! number of frames after every visit instead of decoding everything.
//! Decoding is done by FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).
//!
//! ## Quick Start
//!
//! ### One video
//!
//! ```no_run
//! use slidegrab::CaptureOptions;
//!
//! let options = CaptureOptions::new("slides");
//! let report = slidegrab::process_video("第3讲.mp4", &options)?;
//! println!("{} slides", report.slides.len());
//! # Ok::<(), slidegrab::SlideError>(())
//! ```
//!
//! ### A directory of videos
//!
//! ```no_run
//! use slidegrab::{Batch, CaptureOptions, SteppingOptions};
//!
//! let options = CaptureOptions::new("lectures/ppt")
//!     .with_stepping(SteppingOptions::new().with_skip(50));
//! let report = Batch::new("lectures", options).run()?;
//! println!("{} documents", report.document_count());
//! # Ok::<(), slidegrab::SlideError>(())
//! ```
//!
//! ### Just the detector
//!
//! ```
//! use image::{DynamicImage, RgbImage};
//! use slidegrab::{DetectionOptions, SlideCaptureController, Visit};
//!
//! # struct Discard;
//! # impl slidegrab::SlideSink for Discard {
//! #     fn persist(&mut self, _: &str, _: u32, _: &DynamicImage)
//! #         -> Result<std::path::PathBuf, slidegrab::SlideError> { Ok("x.jpg".into()) }
//! # }
//! let mut controller = SlideCaptureController::new("1", &DetectionOptions::default());
//! let frame = DynamicImage::ImageRgb8(RgbImage::new(1280, 720));
//! assert_eq!(controller.visit(0, &frame, &mut Discard), Visit::Initialized);
//! ```
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | `Batch::run_parallel()` processes the videos of a batch on rayon threads |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod batch;
pub mod capture;
pub mod configuration;
pub mod detector;
pub mod document;
pub mod error;
pub mod ffmpeg;
pub mod frame_source;
pub mod naming;
pub mod progress;
pub mod region;
pub mod stepper;
mod utilities;
pub mod video;

pub use batch::{
    Batch, BatchReport, VideoOutcome, VideoReport, capture_slides, process_source, process_video,
};
pub use capture::{
    CaptureState, CapturedSlide, DirectorySink, FrameObserver, SlideCaptureController, SlideSink,
    Visit,
};
pub use configuration::{
    CaptureOptions, DetectionOptions, ImageFit, OutputOptions, PageOptions, PageOrientation,
    PageSize, Region, SteppingOptions,
};
pub use detector::{ChangeDetector, ChangeEvent, Detection, count_changed_pixels};
pub use document::{AssembledDocument, DocumentAssembler, DocumentSummary, Placement};
pub use error::SlideError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use frame_source::{FrameSource, ImageSequence, VideoSource};
pub use naming::{
    UNKNOWN_LABEL, document_path, existing_slides, label_for_path, lecture_label,
    slide_file_name,
};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use region::{RegionSampler, RegionSamples};
pub use stepper::{FixedSkip, FrameStepper, Step, StepPolicy};
pub use video::VideoFile;
