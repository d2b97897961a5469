//! Slide-change decision.
//!
//! [`ChangeDetector`] compares freshly sampled regions against the stored
//! baseline. Each region is differenced pixel by pixel, binarised at the
//! intensity threshold and counted; the two counts then go through a
//! compound rule that accepts either a joint moderate change in both
//! regions or a strong change in one of them.

use image::GrayImage;

use crate::{configuration::DetectionOptions, region::RegionSamples};

/// Outcome of comparing one visited frame against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Changed pixels in region A.
    pub region_a_pixels: u64,
    /// Changed pixels in region B.
    pub region_b_pixels: u64,
    /// Whether the frame counts as a new slide.
    pub triggered: bool,
}

/// Result of running the detector on one visited frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// No baseline existed; the samples only become the baseline.
    InitializeOnly,
    /// The samples were compared against the baseline.
    Compared(ChangeEvent),
}

/// Pixel-count thresholds plus the intensity cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeDetector {
    intensity_threshold: u8,
    region_a_threshold: u64,
    region_b_threshold: u64,
    region_a_strong_threshold: u64,
    region_b_strong_threshold: u64,
}

impl ChangeDetector {
    /// Build a detector from the thresholds in `options`.
    pub fn new(options: &DetectionOptions) -> Self {
        Self {
            intensity_threshold: options.intensity_threshold,
            region_a_threshold: options.region_a_threshold,
            region_b_threshold: options.region_b_threshold,
            region_a_strong_threshold: options.region_a_strong_threshold,
            region_b_strong_threshold: options.region_b_strong_threshold,
        }
    }

    /// The compound decision rule on two changed-pixel counts.
    ///
    /// ```
    /// use slidegrab::{ChangeDetector, DetectionOptions};
    ///
    /// let detector = ChangeDetector::new(&DetectionOptions::default());
    /// assert!(!detector.is_triggered(100, 301));
    /// assert!(detector.is_triggered(101, 301));
    /// assert!(detector.is_triggered(151, 0));
    /// assert!(detector.is_triggered(0, 1001));
    /// ```
    pub fn is_triggered(&self, region_a_pixels: u64, region_b_pixels: u64) -> bool {
        (region_a_pixels > self.region_a_threshold && region_b_pixels > self.region_b_threshold)
            || region_a_pixels > self.region_a_strong_threshold
            || region_b_pixels > self.region_b_strong_threshold
    }

    /// Compare `current` against `baseline`.
    pub fn compare(&self, current: &RegionSamples, baseline: &RegionSamples) -> ChangeEvent {
        let region_a_pixels = count_changed_pixels(
            &current.region_a,
            &baseline.region_a,
            self.intensity_threshold,
        );
        let region_b_pixels = count_changed_pixels(
            &current.region_b,
            &baseline.region_b,
            self.intensity_threshold,
        );

        ChangeEvent {
            region_a_pixels,
            region_b_pixels,
            triggered: self.is_triggered(region_a_pixels, region_b_pixels),
        }
    }

    /// Compare against the baseline if there is one.
    pub fn detect(&self, current: &RegionSamples, baseline: Option<&RegionSamples>) -> Detection {
        match baseline {
            None => Detection::InitializeOnly,
            Some(baseline) => Detection::Compared(self.compare(current, baseline)),
        }
    }
}

/// Count pixels whose absolute difference exceeds `threshold`.
///
/// Both images come from the same region and so have the same size; if
/// they do not, only the overlapping leading pixels are compared.
pub fn count_changed_pixels(current: &GrayImage, baseline: &GrayImage, threshold: u8) -> u64 {
    current
        .as_raw()
        .iter()
        .zip(baseline.as_raw())
        .filter(|&(&now, &before)| now.abs_diff(before) > threshold)
        .count() as u64
}
