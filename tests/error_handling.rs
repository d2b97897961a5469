//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for bad inputs
//! and bad options.

use std::path::Path;

use slidegrab::{
    CaptureOptions, DetectionOptions, DirectorySink, ImageSequence, Region, SlideError,
    SteppingOptions, VideoFile, capture_slides, process_video,
};

#[test]
fn open_nonexistent_file() {
    let result = VideoFile::open("this_file_does_not_exist.mp4");
    assert!(matches!(result, Err(SlideError::FileOpen { .. })));

    let error_message = result.err().map(|error| error.to_string()).unwrap_or_default();
    assert!(
        error_message.contains("Failed to open video file"),
        "Error message should mention file open failure: {error_message}",
    );
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    let result = VideoFile::open(&invalid_file_path);
    assert!(result.is_err(), "Expected error for invalid video file");
}

#[test]
fn zero_skip_is_rejected() {
    let options = CaptureOptions::new("unused").with_stepping(SteppingOptions::new().with_skip(0));
    let mut sink = DirectorySink::new(&options.output);
    let mut frames = ImageSequence::default();

    let result = capture_slides(&mut frames, "1", &options, &mut sink);
    assert!(matches!(result, Err(SlideError::InvalidSkip)));
}

#[test]
fn region_outside_minimum_frame_is_rejected() {
    let detection =
        DetectionOptions::new().with_region_a(Region::from_bounds(700..760, 1060..1200));
    let options = CaptureOptions::new("unused").with_detection(detection);

    let result = process_video("tests/fixtures/sample_video.mp4", &options);
    assert!(matches!(result, Err(SlideError::InvalidRegion { name: "A", .. })));
}

#[test]
fn empty_region_is_rejected() {
    let detection = DetectionOptions::new().with_region_b(Region::new(10, 10, 0, 20));

    let error = detection.validate().err().map(|error| error.to_string());
    assert!(
        error.as_deref().is_some_and(|message| message.contains("region B")),
        "Error should name region B: {error:?}",
    );
}

#[test]
fn no_video_stream_error() {
    let path = "tests/fixtures/sample_audio_only.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let result = VideoFile::open(path);
    assert!(matches!(result, Err(SlideError::NoVideoStream)));
}
