//! Batch runner integration tests.

use std::{
    fs::File,
    path::Path,
    time::{Duration, SystemTime},
};

use slidegrab::{Batch, CancellationToken, CaptureOptions, OutputOptions, VideoOutcome};

fn write_file(directory: &Path, name: &str, age_seconds: u64) {
    let path = directory.join(name);
    std::fs::write(&path, b"not a video").expect("Failed to write input file");
    let modified = SystemTime::now() - Duration::from_secs(age_seconds);
    File::options()
        .write(true)
        .open(&path)
        .and_then(|file| file.set_modified(modified))
        .expect("Failed to set modification time");
}

#[test]
fn videos_are_ordered_oldest_first() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    write_file(input.path(), "a.mp4", 10);
    write_file(input.path(), "b.mp4", 300);
    write_file(input.path(), "c.mp4", 60);
    std::fs::create_dir(input.path().join("subdirectory")).expect("Failed to create directory");

    let batch = Batch::new(input.path(), CaptureOptions::new(input.path().join("ppt")));
    let videos = batch.videos().expect("Listing should succeed");

    let names: Vec<_> = videos
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["b.mp4", "c.mp4", "a.mp4"]);
}

#[test]
fn unreadable_videos_are_skipped() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    write_file(input.path(), "第1讲.mp4", 20);
    write_file(input.path(), "第2讲.mp4", 10);

    let batch = Batch::new(input.path(), CaptureOptions::new(input.path().join("ppt")));
    let report = batch.run().expect("Batch should run");

    assert!(!report.cancelled);
    assert_eq!(report.outcomes.len(), 2);
    assert!(
        report
            .outcomes
            .iter()
            .all(|outcome| matches!(outcome, VideoOutcome::Skipped { .. }))
    );
    assert_eq!(report.outcomes[0].path(), input.path().join("第1讲.mp4"));
    assert_eq!(report.slide_count(), 0);
    assert_eq!(report.document_count(), 0);
}

#[test]
fn cancelled_batch_stops_before_first_video() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    write_file(input.path(), "one.mp4", 10);
    let token = CancellationToken::new();
    token.cancel();

    let options = CaptureOptions::new(input.path().join("ppt")).with_cancellation(token);
    let report = Batch::new(input.path(), options).run().expect("Batch should run");

    assert!(report.cancelled);
    assert!(report.outcomes.is_empty());
}

#[test]
fn missing_input_directory_is_an_error() {
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    let batch = Batch::new(input.path().join("absent"), CaptureOptions::new("ppt"));

    assert!(batch.run().is_err());
}

#[test]
fn sample_video_produces_report() {
    let path = Path::new("tests/fixtures/sample_video.mp4");
    if !path.exists() {
        return;
    }
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let options = CaptureOptions::new(output.path());

    let report = slidegrab::process_video(path, &options).expect("Processing should succeed");

    assert_eq!(report.source.path, path);
    assert!(report.document_error.is_none());
    let document = report.document.expect("Document should be written");
    assert_eq!(document.pages, report.slides.len().max(1));
}

#[test]
fn second_run_without_overwrite_skips_processed_video() {
    let fixture = Path::new("tests/fixtures/sample_video.mp4");
    if !fixture.exists() {
        return;
    }
    let input = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::copy(fixture, input.path().join("lecture 1.mp4")).expect("Failed to copy fixture");
    let output = input.path().join("ppt");
    let options = CaptureOptions::new(&output)
        .with_output(OutputOptions::new(&output).with_overwrite(false));
    let batch = Batch::new(input.path(), options);

    let first = batch.run().expect("First run should succeed");
    assert!(matches!(first.outcomes[0], VideoOutcome::Completed(_)));

    let second = batch.run().expect("Second run should succeed");
    match &second.outcomes[0] {
        VideoOutcome::Skipped { reason, .. } => {
            assert!(reason.contains("already exists"), "Unexpected reason: {reason}");
        }
        VideoOutcome::Completed(_) => panic!("Existing outputs should skip the video"),
    }
}
