//! FFmpeg frame source integration tests.
//!
//! These need `tests/fixtures/sample_video.mp4` and are skipped without it.

use std::path::Path;

use slidegrab::{FrameSource, FrameStepper, Step, VideoFile};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn open_sample() -> Option<VideoFile> {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return None;
    }
    Some(VideoFile::open(SAMPLE_VIDEO).expect("Failed to open test video"))
}

#[test]
fn metadata_is_populated() {
    let Some(video) = open_sample() else {
        return;
    };

    let source = video.source();
    assert_eq!(source.path, Path::new(SAMPLE_VIDEO));
    assert!(source.width > 0);
    assert!(source.height > 0);
    assert!(source.frames_per_second > 0.0);
    assert!(source.frame_count.is_some_and(|count| count > 0));
}

#[test]
fn sequential_reads_advance_position() {
    let Some(mut video) = open_sample() else {
        return;
    };

    assert_eq!(video.position(), 0);
    let first = video
        .read_frame()
        .expect("First frame should decode")
        .expect("Video should not be empty");
    assert_eq!(video.position(), 1);
    assert_eq!(first.width(), video.source().width);
    assert_eq!(first.height(), video.source().height);

    video.read_frame().expect("Second frame should decode");
    assert_eq!(video.position(), 2);
}

#[test]
fn seek_lands_on_requested_frame() {
    let Some(mut video) = open_sample() else {
        return;
    };
    let target = video.source().frame_count.unwrap_or(0) / 2;

    video.seek(target).expect("Seek should succeed");
    let frame = video.read_frame().expect("Frame after seek should decode");

    assert!(frame.is_some());
    assert_eq!(video.position(), target + 1);
}

#[test]
fn stepping_visits_until_exhausted() {
    let Some(mut video) = open_sample() else {
        return;
    };
    let frame_count = video.source().frame_count.unwrap_or(0);
    let stepper = FrameStepper::fixed(10);
    let mut visited = Vec::new();

    loop {
        if video.read_frame().expect("Frame should decode").is_none() {
            break;
        }
        visited.push(video.position() - 1);
        match stepper.advance(&mut video).expect("Seek should succeed") {
            Step::Continue(_) => {}
            Step::Exhausted => break,
        }
    }

    assert_eq!(visited.first(), Some(&0));
    assert!(visited.windows(2).all(|pair| pair[1] == pair[0] + 11));
    assert!(visited.iter().all(|&index| index < frame_count));
}
