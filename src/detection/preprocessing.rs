use image::{DynamicImage, GrayImage};
use imageproc::contrast::{adaptive_threshold, equalize_histogram};
use imageproc::edges::canny;
use imageproc::filter::median_filter;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Enhance local contrast with histogram equalization
pub fn enhance_contrast(img: &GrayImage) -> GrayImage {
    equalize_histogram(img)
}

/// Binarize adaptively against the local mean
pub fn binarize(img: &GrayImage, block_radius: u32) -> GrayImage {
    adaptive_threshold(img, block_radius)
}

/// Remove speckle noise with a small-kernel median filter
pub fn denoise(img: &GrayImage, radius: u32) -> GrayImage {
    median_filter(img, radius, radius)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}
