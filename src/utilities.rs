//! Internal helpers for FFmpeg frame and timestamp conversion.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 plane into a tightly-packed buffer.
///
/// Decoded planes often carry per-row padding (stride > width x 3); the
/// result has none and can go straight into [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Rescale a PTS value from the stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a 0-based frame index, counted from the stream's
/// first timestamp `start_pts`.
pub(crate) fn pts_to_frame_index(
    pts: i64,
    start_pts: i64,
    time_base: Rational,
    frames_per_second: f64,
) -> u64 {
    let seconds = pts_to_seconds(pts.saturating_sub(start_pts), time_base).max(0.0);
    (seconds * frames_per_second).round() as u64
}

/// Convert a frame index to a container seek timestamp in AV_TIME_BASE
/// (microseconds), as expected by `Input::seek` with no stream selected.
///
/// Container timestamps include the stream start, so `start_seconds` is
/// added back.
pub(crate) fn frame_index_to_seek_timestamp(
    frame_index: u64,
    frames_per_second: f64,
    start_seconds: f64,
) -> i64 {
    let offset = if frames_per_second > 0.0 {
        frame_index as f64 / frames_per_second
    } else {
        0.0
    };
    ((offset + start_seconds) * 1_000_000.0).round() as i64
}
