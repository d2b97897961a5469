use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use slidegrab::{
    Batch, BatchReport, CaptureOptions, DetectionOptions, FfmpegLogLevel, ImageFit,
    OutputOptions, PageOptions, PageOrientation, PageSize, ProgressCallback, ProgressInfo, Region,
    SteppingOptions, VideoFile, VideoOutcome, VideoReport,
};

const CLI_AFTER_HELP: &str = "Examples:\n  slidegrab extract ~/lectures --out ~/lectures/ppt --progress\n  slidegrab video 第3讲.mp4 --skip 50 --json\n  slidegrab video talk.mp4 --region-a 400..600,1000..1200 --fit contain\n  slidegrab probe 第3讲.mp4\n  slidegrab completions zsh > _slidegrab";

#[derive(Debug, Parser)]
#[command(
    name = "slidegrab",
    version,
    about = "Capture slide changes from lecture recordings and bind them into PDFs",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Log every capture and document write (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar per video.
    #[arg(long, global = true)]
    progress: bool,

    /// Skip videos whose slide images or document already exist instead of
    /// overwriting them.
    #[arg(long, global = true)]
    no_overwrite: bool,

    /// Print a machine-readable JSON summary.
    #[arg(long, global = true)]
    json: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Args, Clone, Default)]
struct CaptureArgs {
    /// Output directory for slides and documents (default: `ppt` next to the input).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Frames skipped between two visited frames.
    #[arg(long)]
    skip: Option<u64>,

    /// Region A as ROWS,COLUMNS half-open ranges, e.g. 480..660,1060..1200.
    #[arg(long, value_parser = parse_region)]
    region_a: Option<Region>,

    /// Region B as ROWS,COLUMNS half-open ranges, e.g. 280..500,340..540.
    #[arg(long, value_parser = parse_region)]
    region_b: Option<Region>,

    /// Per-pixel intensity difference that counts as changed (0-255).
    #[arg(long)]
    intensity_threshold: Option<u8>,

    /// Region A pixel count for the joint rule.
    #[arg(long)]
    joint_threshold_a: Option<u64>,

    /// Region B pixel count for the joint rule.
    #[arg(long)]
    joint_threshold_b: Option<u64>,

    /// Region A pixel count that triggers on its own.
    #[arg(long)]
    strong_threshold_a: Option<u64>,

    /// Region B pixel count that triggers on its own.
    #[arg(long)]
    strong_threshold_b: Option<u64>,

    /// Frames narrower than this are skipped.
    #[arg(long)]
    min_width: Option<u32>,

    /// Frames shorter than this are skipped.
    #[arg(long)]
    min_height: Option<u32>,

    /// Page size: a4 | letter | WIDTHxHEIGHT in millimetres.
    #[arg(long, default_value = "a4")]
    page_size: String,

    /// Use portrait pages instead of landscape.
    #[arg(long)]
    portrait: bool,

    /// Page margin in millimetres.
    #[arg(long, default_value_t = 15.0)]
    margin: f32,

    /// Slide placement on the page: stretch | contain.
    #[arg(long, default_value = "stretch")]
    fit: String,

    /// Slide image extension (jpg, png, bmp).
    #[arg(long, default_value = "jpg")]
    ext: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process every video in a directory, oldest first.
    #[command(
        about = "Capture slides from every video in a directory",
        after_help = "Examples:\n  slidegrab extract ~/lectures\n  slidegrab extract ~/lectures --out slides --skip 200 --progress"
    )]
    Extract {
        /// Directory of video files.
        input: PathBuf,
        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Process a single video file.
    #[command(
        about = "Capture slides from one video",
        after_help = "Examples:\n  slidegrab video 第3讲.mp4\n  slidegrab video 第3讲.mp4 --out slides --page-size letter --portrait"
    )]
    Video {
        /// Video file.
        input: PathBuf,
        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Print what the detector will see in a video.
    #[command(about = "Print video metadata", visible_alias = "info")]
    Probe {
        /// Video file.
        input: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_range(value: &str) -> Result<(u32, u32), String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got {value:?}"))?;
    let start = start
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid range start {start:?}: {error}"))?;
    let end = end
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid range end {end:?}: {error}"))?;
    if end <= start {
        return Err(format!("range {start}..{end} is empty"));
    }
    Ok((start, end))
}

fn parse_region(value: &str) -> Result<Region, String> {
    let (rows, columns) = value
        .split_once(',')
        .ok_or_else(|| format!("expected ROWS,COLUMNS, got {value:?}"))?;
    let (top, bottom) = parse_range(rows)?;
    let (left, right) = parse_range(columns)?;
    Ok(Region::from_bounds(top..bottom, left..right))
}

fn parse_page_size(value: &str) -> Option<PageSize> {
    match value.to_ascii_lowercase().as_str() {
        "a4" => Some(PageSize::A4),
        "letter" => Some(PageSize::Letter),
        custom => {
            let (width, height) = custom.split_once('x')?;
            let width_mm = width.trim().parse::<f32>().ok().filter(|w| *w > 0.0)?;
            let height_mm = height.trim().parse::<f32>().ok().filter(|h| *h > 0.0)?;
            Some(PageSize::Custom {
                width_mm,
                height_mm,
            })
        }
    }
}

fn parse_fit(value: &str) -> Option<ImageFit> {
    match value.to_ascii_lowercase().as_str() {
        "stretch" | "fill" => Some(ImageFit::Stretch),
        "contain" | "fit" => Some(ImageFit::Contain),
        _ => None,
    }
}

fn detection_options(args: &CaptureArgs) -> DetectionOptions {
    let defaults = DetectionOptions::default();
    let mut options = defaults
        .clone()
        .with_joint_thresholds(
            args.joint_threshold_a.unwrap_or(defaults.region_a_threshold),
            args.joint_threshold_b.unwrap_or(defaults.region_b_threshold),
        )
        .with_strong_thresholds(
            args.strong_threshold_a
                .unwrap_or(defaults.region_a_strong_threshold),
            args.strong_threshold_b
                .unwrap_or(defaults.region_b_strong_threshold),
        )
        .with_min_dimensions(
            args.min_width.unwrap_or(defaults.min_width),
            args.min_height.unwrap_or(defaults.min_height),
        );
    if let Some(region) = args.region_a {
        options = options.with_region_a(region);
    }
    if let Some(region) = args.region_b {
        options = options.with_region_b(region);
    }
    if let Some(threshold) = args.intensity_threshold {
        options = options.with_intensity_threshold(threshold);
    }
    options
}

fn capture_options(
    args: &CaptureArgs,
    default_out: PathBuf,
    global: &GlobalOptions,
    progress: Option<Arc<TerminalProgress>>,
) -> Result<CaptureOptions, Box<dyn std::error::Error>> {
    let page_size = parse_page_size(&args.page_size)
        .ok_or(format!("unsupported --page-size: {}", args.page_size))?;
    let fit = parse_fit(&args.fit).ok_or(format!("unsupported --fit: {}", args.fit))?;
    let orientation = if args.portrait {
        PageOrientation::Portrait
    } else {
        PageOrientation::Landscape
    };

    let mut stepping = SteppingOptions::new();
    if let Some(skip) = args.skip {
        stepping = stepping.with_skip(skip);
    }

    let out = args.out.clone().unwrap_or(default_out);
    let mut options = CaptureOptions::new(&out)
        .with_detection(detection_options(args))
        .with_stepping(stepping)
        .with_output(
            OutputOptions::new(&out)
                .with_image_extension(&args.ext)
                .with_overwrite(!global.no_overwrite),
        )
        .with_page(
            PageOptions::new()
                .with_size(page_size)
                .with_orientation(orientation)
                .with_margin_mm(args.margin)
                .with_fit(fit),
        );

    if let Some(progress) = progress {
        options = options.with_progress(progress);
    }

    options.validate()?;
    Ok(options)
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        slidegrab::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {prefix:.bold} {bar:40.cyan/blue} {percent}% {msg} [{elapsed_precise}<{eta}]",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let name = info
            .video
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_prefix(name);
        let total = info.total_frames.unwrap_or(0);
        self.bar.set_length(total);
        let position = match info.percentage {
            Some(percentage) => (total as f32 * percentage / 100.0) as u64,
            None => info.current_frame,
        };
        self.bar.set_position(position);
        self.bar
            .set_message(format!("{} slide(s)", info.slides_captured));
    }
}

fn video_json(report: &VideoReport) -> Value {
    json!({
        "path": report.source.path.display().to_string(),
        "frame_count": report.source.frame_count,
        "slides": report.slides.iter().map(|slide| json!({
            "sequence": slide.sequence,
            "frame_index": slide.frame_index,
            "path": slide.path.display().to_string(),
            "region_a_pixels": slide.event.region_a_pixels,
            "region_b_pixels": slide.event.region_b_pixels,
        })).collect::<Vec<_>>(),
        "document": report.document.as_ref().map(|document| json!({
            "path": document.path.display().to_string(),
            "pages": document.pages,
            "skipped_images": document.skipped.len(),
        })),
        "document_error": report.document_error,
    })
}

fn outcome_json(outcome: &VideoOutcome) -> Value {
    match outcome {
        VideoOutcome::Completed(report) => video_json(report),
        VideoOutcome::Skipped { path, reason } => json!({
            "path": path.display().to_string(),
            "skipped": reason,
        }),
    }
}

fn print_video(report: &VideoReport) {
    let name = report.source.path.display();
    match &report.document {
        Some(document) => println!(
            "{} {name}: {} slide(s) -> {} ({} page(s))",
            "done".green().bold(),
            report.slides.len(),
            document.path.display(),
            document.pages,
        ),
        None => println!(
            "{} {name}: {} slide(s), document failed: {}",
            "partial".yellow().bold(),
            report.slides.len(),
            report
                .document_error
                .as_deref()
                .unwrap_or("unknown error")
                .yellow(),
        ),
    }
}

fn print_batch(report: &BatchReport) {
    for outcome in &report.outcomes {
        match outcome {
            VideoOutcome::Completed(video) => print_video(video),
            VideoOutcome::Skipped { path, reason } => println!(
                "{} {}: {}",
                "skipped".yellow().bold(),
                path.display(),
                reason.yellow(),
            ),
        }
    }
    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "{} slide(s), {} document(s) from {} file(s)",
            report.slide_count(),
            report.document_count(),
            report.outcomes.len(),
        )
        .green()
    );
}

fn default_output_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .join("ppt")
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    let progress = if cli.global.progress {
        Some(Arc::new(TerminalProgress::new()?))
    } else {
        None
    };

    match cli.command {
        Commands::Extract { input, capture } => {
            if !input.is_dir() {
                return Err(format!("not a directory: {}", input.display()).into());
            }
            let options =
                capture_options(&capture, input.join("ppt"), &cli.global, progress.clone())?;
            let report = Batch::new(&input, options).run()?;
            if let Some(progress) = &progress {
                progress.bar.finish_and_clear();
            }

            if cli.global.json {
                let payload = json!({
                    "videos": report.outcomes.iter().map(outcome_json).collect::<Vec<_>>(),
                    "slides": report.slide_count(),
                    "documents": report.document_count(),
                    "cancelled": report.cancelled,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_batch(&report);
            }
        }
        Commands::Video { input, capture } => {
            let options = capture_options(
                &capture,
                default_output_for(&input),
                &cli.global,
                progress.clone(),
            )?;
            let report = slidegrab::process_video(&input, &options)?;
            if let Some(progress) = &progress {
                progress.bar.finish_and_clear();
            }

            if cli.global.json {
                println!("{}", serde_json::to_string_pretty(&video_json(&report))?);
            } else {
                print_video(&report);
            }
        }
        Commands::Probe { input } => {
            let video = VideoFile::open(&input)?;
            let source = video.source();
            let detection = DetectionOptions::default();
            let sampleable =
                source.width >= detection.min_width && source.height >= detection.min_height;
            if cli.global.json {
                let payload = json!({
                    "path": source.path.display().to_string(),
                    "width": source.width,
                    "height": source.height,
                    "fps": source.frames_per_second,
                    "frame_count": source.frame_count,
                    "sampleable": sampleable,
                    "label": slidegrab::label_for_path(&source.path),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Video: {}", source.path.display());
                println!(
                    "Size: {}x{} @ {:.2} fps",
                    source.width, source.height, source.frames_per_second
                );
                match source.frame_count {
                    Some(count) => println!("Frames: {count}"),
                    None => println!("Frames: unknown"),
                }
                println!("Label: {}", slidegrab::label_for_path(&source.path));
                if !sampleable {
                    println!(
                        "{} frames are smaller than {}x{}; every frame will be skipped",
                        "warning:".yellow().bold(),
                        detection.min_width,
                        detection.min_height,
                    );
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "slidegrab", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_region_bounds() {
        let region = parse_region("480..660,1060..1200").unwrap();
        assert_eq!(region, Region::new(480, 1060, 180, 140));

        assert!(parse_region("480..660").is_err());
        assert!(parse_region("660..480,0..10").is_err());
        assert!(parse_region("a..b,0..10").is_err());
    }

    #[test]
    fn parse_page_size_aliases() {
        assert_eq!(parse_page_size("A4"), Some(PageSize::A4));
        assert_eq!(parse_page_size("letter"), Some(PageSize::Letter));
        assert_eq!(
            parse_page_size("160x90"),
            Some(PageSize::Custom {
                width_mm: 160.0,
                height_mm: 90.0
            })
        );
        assert_eq!(parse_page_size("0x90"), None);
        assert_eq!(parse_page_size("tabloid"), None);
    }

    #[test]
    fn parse_fit_aliases() {
        assert_eq!(parse_fit("stretch"), Some(ImageFit::Stretch));
        assert_eq!(parse_fit("Contain"), Some(ImageFit::Contain));
        assert_eq!(parse_fit("cover"), None);
    }

    #[test]
    fn flags_override_detection_defaults() {
        let args = CaptureArgs {
            skip: Some(25),
            intensity_threshold: Some(12),
            strong_threshold_b: Some(2000),
            ..CaptureArgs::default()
        };
        let detection = detection_options(&args);
        assert_eq!(detection.intensity_threshold, 12);
        assert_eq!(detection.region_b_strong_threshold, 2000);
        assert_eq!(detection.region_a_threshold, 100);
        assert_eq!(detection.region_a, DetectionOptions::default().region_a);
    }

    fn parsed_overwrite(arguments: &[&str]) -> bool {
        let cli = Cli::try_parse_from(arguments).unwrap();
        let Commands::Video { capture, .. } = &cli.command else {
            panic!("expected the video subcommand");
        };
        capture_options(capture, PathBuf::from("ppt"), &cli.global, None)
            .unwrap()
            .output
            .overwrite
    }

    #[test]
    fn overwrite_is_on_unless_disabled() {
        assert!(parsed_overwrite(&["slidegrab", "video", "talk.mp4"]));
        assert!(!parsed_overwrite(&["slidegrab", "--no-overwrite", "video", "talk.mp4"]));
        assert!(!parsed_overwrite(&["slidegrab", "video", "talk.mp4", "--no-overwrite"]));
    }

    #[test]
    fn default_output_sits_next_to_input() {
        assert_eq!(
            default_output_for(Path::new("videos/第1讲.mp4")),
            PathBuf::from("videos/ppt")
        );
        assert_eq!(default_output_for(Path::new("talk.mp4")), PathBuf::from("./ppt"));
    }
}
