//! Error types for the `slidegrab` crate.
//!
//! This module defines [`SlideError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry the file paths, frame
//! indices and upstream messages needed to tell a skipped frame from a
//! skipped video.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `slidegrab` operations.
///
/// The capture loop and the batch runner decide per variant whether a
/// failure costs one frame, one slide, one document or one video; none of
/// them aborts a batch.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SlideError {
    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The frame is smaller than the layout the regions were tuned for.
    #[error(
        "Frame is {width}x{height}, smaller than the required {min_width}x{min_height}"
    )]
    InsufficientDimensions {
        /// Width of the rejected frame.
        width: u32,
        /// Height of the rejected frame.
        height: u32,
        /// Configured minimum width.
        min_width: u32,
        /// Configured minimum height.
        min_height: u32,
    },

    /// A configured region is empty or does not fit inside the minimum frame.
    #[error("Invalid region {name}: {reason}")]
    InvalidRegion {
        /// Which region failed validation (`"A"` or `"B"`).
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// A frame skip of zero was configured.
    #[error("Frame skip must be greater than zero")]
    InvalidSkip,

    /// A captured slide image could not be written.
    #[error("Failed to write slide image {path}: {reason}")]
    ImageWrite {
        /// Destination of the image.
        path: PathBuf,
        /// Underlying reason the write failed.
        reason: String,
    },

    /// The paginated document could not be written.
    #[error("Failed to write document {path}: {reason}")]
    DocumentWrite {
        /// Destination of the document.
        path: PathBuf,
        /// Underlying reason the write failed.
        reason: String,
    },

    /// The PDF object graph could not be built or serialised.
    #[error("PDF error: {0}")]
    PdfError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// Outputs of an earlier run are present and overwriting is disabled.
    #[error("Output already exists: {path}")]
    OutputExists {
        /// One of the existing files.
        path: PathBuf,
    },
}

impl From<FfmpegError> for SlideError {
    fn from(error: FfmpegError) -> Self {
        SlideError::FfmpegError(error.to_string())
    }
}

impl From<lopdf::Error> for SlideError {
    fn from(error: lopdf::Error) -> Self {
        SlideError::PdfError(error.to_string())
    }
}
