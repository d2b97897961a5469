//! Benchmarks for region sampling, change detection and video capture.
//!
//! Run with: cargo bench
//!
//! The end-to-end benchmark needs `tests/fixtures/sample_video.mp4` and is
//! skipped without it.

use std::{hint::black_box, path::Path};

use criterion::Criterion;
use image::{DynamicImage, Rgb, RgbImage};
use slidegrab::{
    CaptureOptions, ChangeDetector, DetectionOptions, FfmpegLogLevel, FrameStepper,
    ImageSequence, Region, RegionSampler, SlideCaptureController, SlideSink, SlideError,
    SteppingOptions, VideoFile,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

struct DiscardSink;

impl SlideSink for DiscardSink {
    fn persist(
        &mut self,
        label: &str,
        sequence: u32,
        _frame: &DynamicImage,
    ) -> Result<std::path::PathBuf, SlideError> {
        Ok(format!("{label}_{sequence}.jpg").into())
    }
}

fn synthetic_frame(shade: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(1280, 720, |x, y| {
        Rgb([shade, (x % 256) as u8, (y % 256) as u8])
    }))
}

fn benchmark_sampling(criterion: &mut Criterion) {
    let options = DetectionOptions::default();
    let sampler = RegionSampler::new(&options);
    let frame = synthetic_frame(40);

    criterion.bench_function("sample both regions (1280x720)", |bencher| {
        bencher.iter(|| sampler.sample(black_box(&frame)).unwrap());
    });

    let large = DynamicImage::ImageRgb8(RgbImage::new(1920, 1080));
    criterion.bench_function("sample both regions (1920x1080)", |bencher| {
        bencher.iter(|| sampler.sample(black_box(&large)).unwrap());
    });
}

fn benchmark_detection(criterion: &mut Criterion) {
    let options = DetectionOptions::default();
    let sampler = RegionSampler::new(&options);
    let detector = ChangeDetector::new(&options);
    let baseline = sampler.sample(&synthetic_frame(0)).unwrap();
    let current = sampler.sample(&synthetic_frame(200)).unwrap();

    criterion.bench_function("compare regions against baseline", |bencher| {
        bencher.iter(|| detector.compare(black_box(&current), black_box(&baseline)));
    });
}

fn benchmark_controller(criterion: &mut Criterion) {
    let frames: Vec<DynamicImage> = (0..20).map(|index| synthetic_frame(index * 10)).collect();

    criterion.bench_function("capture loop over 20 in-memory frames", |bencher| {
        bencher.iter(|| {
            let mut source = ImageSequence::new(frames.clone());
            let controller = SlideCaptureController::new("bench", &DetectionOptions::default());
            controller.run(&mut source, &FrameStepper::fixed(1), &mut DiscardSink)
        });
    });
}

fn benchmark_video_capture(criterion: &mut Criterion) {
    slidegrab::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    // The fixture is smaller than the lecture layout; watch its corner.
    let corner = Region::new(0, 0, 16, 16);
    let detection = DetectionOptions::new()
        .with_min_dimensions(16, 16)
        .with_region_a(corner)
        .with_region_b(corner);
    let options = CaptureOptions::new("unused")
        .with_detection(detection)
        .with_stepping(SteppingOptions::new().with_skip(10));

    criterion.bench_function("capture loop over fixture video (skip 10)", |bencher| {
        bencher.iter(|| {
            let mut video = VideoFile::open(SAMPLE_VIDEO).unwrap();
            slidegrab::capture_slides(&mut video, "bench", &options, &mut DiscardSink).unwrap()
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_sampling,
    benchmark_detection,
    benchmark_controller,
    benchmark_video_capture,
);
criterion::criterion_main!(benches);
