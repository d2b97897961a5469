//! Region-of-interest sampling.
//!
//! [`RegionSampler`] cuts the two configured rectangles out of a frame and
//! converts them to 8-bit intensity, after checking that the frame is at
//! least as large as the layout the rectangles were placed for.

use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgb};

use crate::{
    configuration::{DetectionOptions, Region},
    error::SlideError,
};

/// Grayscale samples of region A and region B from one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSamples {
    /// Intensity image of region A.
    pub region_a: GrayImage,
    /// Intensity image of region B.
    pub region_b: GrayImage,
}

/// Extracts the two regions of interest from frames.
#[derive(Debug, Clone)]
pub struct RegionSampler {
    region_a: Region,
    region_b: Region,
    min_width: u32,
    min_height: u32,
}

impl RegionSampler {
    /// Build a sampler from the regions and minimum size in `options`.
    pub fn new(options: &DetectionOptions) -> Self {
        Self {
            region_a: options.region_a,
            region_b: options.region_b,
            min_width: options.min_width,
            min_height: options.min_height,
        }
    }

    /// Sample both regions of `frame`.
    ///
    /// # Errors
    ///
    /// [`SlideError::InsufficientDimensions`] if the frame is narrower or
    /// shorter than the configured minimum. Such frames are never sampled.
    pub fn sample(&self, frame: &DynamicImage) -> Result<RegionSamples, SlideError> {
        let (width, height) = frame.dimensions();
        if width < self.min_width || height < self.min_height {
            return Err(SlideError::InsufficientDimensions {
                width,
                height,
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }

        Ok(RegionSamples {
            region_a: grayscale_region(frame, &self.region_a),
            region_b: grayscale_region(frame, &self.region_b),
        })
    }
}

/// Crop `region` out of `frame` as BT.601 luma.
///
/// Uses the 0.299 / 0.587 / 0.114 weights with rounding, not the Rec. 709
/// weights of [`DynamicImage::to_luma8`].
fn grayscale_region(frame: &DynamicImage, region: &Region) -> GrayImage {
    let crop = frame
        .crop_imm(region.left, region.top, region.width, region.height)
        .to_rgb8();
    GrayImage::from_fn(crop.width(), crop.height(), |x, y| {
        let Rgb([r, g, b]) = *crop.get_pixel(x, y);
        let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
        Luma([((weighted + 500) / 1000) as u8])
    })
}

#[cfg(test)]
mod tests {
    use image::RgbImage;

    use super::*;

    fn frame(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn samples_have_region_dimensions() {
        let sampler = RegionSampler::new(&DetectionOptions::default());
        let samples = sampler.sample(&frame(1280, 720, [10, 20, 30])).unwrap();

        assert_eq!(samples.region_a.dimensions(), (140, 180));
        assert_eq!(samples.region_b.dimensions(), (200, 220));
    }

    #[test]
    fn luma_uses_bt601_weights() {
        let sampler = RegionSampler::new(&DetectionOptions::default());

        let white = sampler.sample(&frame(1280, 720, [255, 255, 255])).unwrap();
        assert_eq!(white.region_a.get_pixel(0, 0), &Luma([255]));

        let red = sampler.sample(&frame(1280, 720, [255, 0, 0])).unwrap();
        assert_eq!(red.region_b.get_pixel(5, 5), &Luma([76]));

        let green = sampler.sample(&frame(1280, 720, [0, 255, 0])).unwrap();
        assert_eq!(green.region_b.get_pixel(5, 5), &Luma([150]));
    }

    #[test]
    fn region_content_comes_from_the_right_place() {
        let mut image = RgbImage::new(1280, 720);
        // Paint a single pixel at the top-left corner of region A.
        image.put_pixel(1060, 480, Rgb([255, 255, 255]));
        let sampler = RegionSampler::new(&DetectionOptions::default());
        let samples = sampler.sample(&DynamicImage::ImageRgb8(image)).unwrap();

        assert_eq!(samples.region_a.get_pixel(0, 0), &Luma([255]));
        assert_eq!(samples.region_a.get_pixel(1, 0), &Luma([0]));
        assert!(samples.region_b.pixels().all(|pixel| pixel.0[0] == 0));
    }

    #[test]
    fn small_frames_are_rejected() {
        let sampler = RegionSampler::new(&DetectionOptions::default());

        for (width, height) in [(1279, 720), (1280, 719), (640, 360)] {
            let result = sampler.sample(&frame(width, height, [0, 0, 0]));
            assert!(matches!(
                result,
                Err(SlideError::InsufficientDimensions { min_width: 1280, min_height: 720, .. })
            ));
        }
    }

    #[test]
    fn larger_frames_are_accepted() {
        let sampler = RegionSampler::new(&DetectionOptions::default());
        assert!(sampler.sample(&frame(1920, 1080, [0, 0, 0])).is_ok());
    }
}
