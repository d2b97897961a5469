//! Frame sources.
//!
//! [`FrameSource`] is the seam between decoding and detection: the capture
//! loop only needs to read the frame at the current position, jump to
//! another position, and know how many frames exist. [`VideoFile`]
//! implements it with FFmpeg; [`ImageSequence`] serves pre-decoded frames
//! from memory.
//!
//! [`VideoFile`]: crate::VideoFile

use std::{path::PathBuf, time::SystemTime};

use image::DynamicImage;

use crate::error::SlideError;

/// Sequential, seekable access to the frames of one video.
///
/// Positions are 0-based frame indices. [`position`](FrameSource::position)
/// is the index the next [`read_frame`](FrameSource::read_frame) returns,
/// so right after reading frame `i` it is `i + 1`.
pub trait FrameSource {
    /// Total number of frames, if the container reports it.
    fn frame_count(&self) -> Option<u64>;

    /// Index of the frame the next read returns.
    fn position(&self) -> u64;

    /// Decode the frame at [`position`](FrameSource::position) and advance
    /// past it.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. An `Err` means this
    /// one frame is unusable; the source stays readable after a seek.
    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SlideError>;

    /// Move so that the next read returns frame `frame_index`.
    fn seek(&mut self, frame_index: u64) -> Result<(), SlideError>;
}

/// Immutable facts about one input video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSource {
    /// Path the video was opened from.
    pub path: PathBuf,
    /// Total frame count, derived from duration and average frame rate.
    /// `None` if the container does not report enough to compute it.
    pub frame_count: Option<u64>,
    /// Average frame rate.
    pub frames_per_second: f64,
    /// Coded frame width.
    pub width: u32,
    /// Coded frame height.
    pub height: u32,
    /// Last modification time, used to order a batch.
    pub modified: Option<SystemTime>,
}

/// An in-memory [`FrameSource`] over already-decoded frames.
///
/// ```
/// use image::{DynamicImage, RgbImage};
/// use slidegrab::{FrameSource, ImageSequence};
///
/// let frame = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
/// let mut sequence = ImageSequence::new(vec![frame.clone(), frame]);
/// assert_eq!(sequence.frame_count(), Some(2));
/// sequence.seek(1).unwrap();
/// assert!(sequence.read_frame().unwrap().is_some());
/// assert!(sequence.read_frame().unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImageSequence {
    frames: Vec<DynamicImage>,
    position: u64,
}

impl ImageSequence {
    /// Wrap `frames`, positioned at the first one.
    pub fn new(frames: Vec<DynamicImage>) -> Self {
        Self {
            frames,
            position: 0,
        }
    }
}

impl FrameSource for ImageSequence {
    fn frame_count(&self) -> Option<u64> {
        Some(self.frames.len() as u64)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SlideError> {
        let frame = usize::try_from(self.position)
            .ok()
            .and_then(|index| self.frames.get(index))
            .cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn seek(&mut self, frame_index: u64) -> Result<(), SlideError> {
        self.position = frame_index;
        Ok(())
    }
}
