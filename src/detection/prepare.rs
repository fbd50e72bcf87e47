use super::preprocessing;
use crate::models::{Frame, PreparedImage, Region};

/// Normalizes a cropped region (or the full frame) for recognition.
///
/// Pure and idempotent: the same input always yields the same output, and
/// the stage knows nothing about session state.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    pub block_radius: u32,
    pub median_radius: u32,
}

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self {
            block_radius: 12,
            median_radius: 1,
        }
    }

    pub fn prepare(&self, frame: &Frame, region: Option<&Region>) -> PreparedImage {
        let cropped = match region {
            Some(region) => region.crop(frame),
            None => frame.image.clone(),
        };
        let gray = preprocessing::to_grayscale(&cropped);
        let equalized = preprocessing::enhance_contrast(&gray);
        let binary = preprocessing::binarize(&equalized, self.block_radius);
        let denoised = preprocessing::denoise(&binary, self.median_radius);
        PreparedImage { image: denoised }
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    #[test]
    fn preparation_is_deterministic() {
        let mut img = RgbImage::new(64, 64);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 3) as u8, (y * 2) as u8, ((x + y) % 255) as u8]);
        }
        let frame = Frame::new(DynamicImage::ImageRgb8(img));
        let prep = ImagePreprocessor::new();

        let a = prep.prepare(&frame, None);
        let b = prep.prepare(&frame, None);
        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }

    #[test]
    fn region_crop_bounds_the_output() {
        let frame = Frame::new(DynamicImage::new_rgb8(200, 100));
        let region = Region {
            x: 20,
            y: 10,
            width: 120,
            height: 40,
        };
        let prep = ImagePreprocessor::new();
        let out = prep.prepare(&frame, Some(&region));
        assert_eq!((out.width(), out.height()), (120, 40));
    }
}
