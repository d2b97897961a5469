//! FFmpeg-backed [`FrameSource`].
//!
//! [`VideoFile`] opens a video, caches its [`VideoSource`] metadata and
//! keeps one decoder alive for the whole capture run. Seeking jumps the
//! demuxer to the nearest keyframe before the target and then decodes
//! forward, discarding pre-roll frames, so the next read returns exactly
//! the requested index without decoding the skipped span.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::Path,
};

use ffmpeg_next::{
    Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{
    error::SlideError,
    frame_source::{FrameSource, VideoSource},
    utilities::{
        frame_index_to_seek_timestamp, frame_to_rgb_buffer, pts_to_frame_index, pts_to_seconds,
    },
};

/// An opened video file, readable frame by frame.
///
/// # Example
///
/// ```no_run
/// use slidegrab::{FrameSource, VideoFile};
///
/// let mut video = VideoFile::open("lecture.mp4")?;
/// println!("{} frames", video.source().frame_count.unwrap_or(0));
/// video.seek(500)?;
/// if let Some(frame) = video.read_frame()? {
///     frame.save("frame_500.png")?;
/// }
/// # Ok::<(), slidegrab::SlideError>(())
/// ```
pub struct VideoFile {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    source: VideoSource,
    position: u64,
    end_of_stream: bool,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("source", &self.source)
            .field("stream_index", &self.stream_index)
            .field("position", &self.position)
            .field("end_of_stream", &self.end_of_stream)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file and prepare its best video stream for decoding.
    ///
    /// # Errors
    ///
    /// - [`SlideError::FileOpen`] if FFmpeg cannot open or probe the file.
    /// - [`SlideError::NoVideoStream`] if the file has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SlideError> {
        let path = path.as_ref();
        let open_error = |reason: String| SlideError::FileOpen {
            path: path.to_path_buf(),
            reason,
        };

        log::debug!("Opening video file: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let (stream_index, time_base, start_pts, frames_per_second, stream_frames, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(SlideError::NoVideoStream)?;

            let frame_rate = stream.avg_frame_rate();
            let frames_per_second = if frame_rate.denominator() != 0 {
                frame_rate.numerator() as f64 / frame_rate.denominator() as f64
            } else {
                let rate = stream.rate();
                if rate.denominator() != 0 {
                    rate.numerator() as f64 / rate.denominator() as f64
                } else {
                    0.0
                }
            };

            let decoder_context = CodecContext::from_parameters(stream.parameters())
                .map_err(|error| open_error(format!("Failed to read codec parameters: {error}")))?;
            let decoder = decoder_context
                .decoder()
                .video()
                .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

            // Transport streams from capture systems rarely start at zero.
            let start_pts = match stream.start_time() {
                ffmpeg_next::ffi::AV_NOPTS_VALUE => 0,
                start => start,
            };

            (
                stream.index(),
                stream.time_base(),
                start_pts,
                frames_per_second,
                stream.frames(),
                decoder,
            )
        };

        let duration_microseconds = input_context.duration();
        let frame_count = if stream_frames > 0 {
            Some(stream_frames as u64)
        } else if duration_microseconds > 0 && frames_per_second > 0.0 {
            Some((duration_microseconds as f64 / 1_000_000.0 * frames_per_second) as u64)
        } else {
            None
        };

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| open_error(format!("Failed to create pixel converter: {error}")))?;

        let modified = std::fs::metadata(path)
            .and_then(|metadata| metadata.modified())
            .ok();

        let source = VideoSource {
            path: path.to_path_buf(),
            frame_count,
            frames_per_second,
            width,
            height,
            modified,
        };

        log::debug!(
            "Opened {}: {}x{} @ {:.3} fps, {:?} frames",
            path.display(),
            width,
            height,
            frames_per_second,
            frame_count,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            stream_index,
            time_base,
            start_pts,
            source,
            position: 0,
            end_of_stream: false,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
        })
    }

    /// Metadata cached at open time.
    pub fn source(&self) -> &VideoSource {
        &self.source
    }

    fn next_packet(&mut self) -> Option<Packet> {
        let stream_index = self.stream_index;
        self.input_context
            .packets()
            .find_map(|(stream, packet)| (stream.index() == stream_index).then_some(packet))
    }

    fn decoded_frame_index(&self) -> u64 {
        self.decoded_frame
            .timestamp()
            .or_else(|| self.decoded_frame.pts())
            .map(|pts| {
                pts_to_frame_index(
                    pts,
                    self.start_pts,
                    self.time_base,
                    self.source.frames_per_second,
                )
            })
            .unwrap_or(self.position)
    }

    fn convert_decoded_frame(&mut self) -> Result<DynamicImage, SlideError> {
        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let width = self.rgb_frame.width();
        let height = self.rgb_frame.height();
        let buffer = frame_to_rgb_buffer(&self.rgb_frame, width, height);
        let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            SlideError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(rgb_image))
    }
}

impl FrameSource for VideoFile {
    fn frame_count(&self) -> Option<u64> {
        self.source.frame_count
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, SlideError> {
        loop {
            while self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let frame_index = self.decoded_frame_index();
                if frame_index < self.position {
                    // Pre-roll between the keyframe and the seek target.
                    continue;
                }
                self.position = frame_index + 1;
                return self.convert_decoded_frame().map(Some);
            }

            if self.end_of_stream {
                return Ok(None);
            }

            match self.next_packet() {
                Some(packet) => self.decoder.send_packet(&packet).map_err(|error| {
                    SlideError::VideoDecodeError(format!(
                        "Failed to decode packet near frame {}: {error}",
                        self.position
                    ))
                })?,
                None => {
                    self.decoder.send_eof()?;
                    self.end_of_stream = true;
                }
            }
        }
    }

    fn seek(&mut self, frame_index: u64) -> Result<(), SlideError> {
        let timestamp = frame_index_to_seek_timestamp(
            frame_index,
            self.source.frames_per_second,
            pts_to_seconds(self.start_pts, self.time_base),
        );
        log::debug!(
            "Seeking {} to frame {frame_index} ({timestamp} us)",
            self.source.path.display()
        );

        self.input_context.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.end_of_stream = false;
        self.position = frame_index;
        Ok(())
    }
}
