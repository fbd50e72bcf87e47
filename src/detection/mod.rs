pub mod contours;
pub mod prepare;
pub mod preprocessing;

pub use contours::PlateCandidate;
pub use prepare::ImagePreprocessor;

use crate::config::PipelineConfig;
use crate::models::{Frame, Region};
use log::debug;

/// Finds the most plate-like sub-rectangle of a frame.
///
/// Heuristic single-pass selection: candidates are visited in contour-scan
/// order and the FIRST one satisfying the aspect/area constraints wins.
/// Earlier matches beat larger later ones; that trade of quality for
/// simplicity is deliberate and covered by tests. No qualifying candidate
/// means "use the full frame" (`None`).
pub struct RegionExtractor {
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    pub min_area: u32,
    pub block_radius: u32,
    pub median_radius: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub min_contour_pixels: u32,
}

impl RegionExtractor {
    pub fn new() -> Self {
        Self {
            min_aspect_ratio: 2.0,
            max_aspect_ratio: 5.0,
            min_area: 1000,
            block_radius: 12,
            median_radius: 1,
            canny_low: 50.0,
            canny_high: 100.0,
            min_contour_pixels: 10,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_aspect_ratio: config.min_aspect_ratio,
            max_aspect_ratio: config.max_aspect_ratio,
            min_area: config.min_region_area,
            ..Self::new()
        }
    }

    /// Run the localization pass on a frame.
    pub fn extract(&self, frame: &Frame) -> Option<Region> {
        let gray = preprocessing::to_grayscale(&frame.image);
        let equalized = preprocessing::enhance_contrast(&gray);
        let binary = preprocessing::binarize(&equalized, self.block_radius);
        let denoised = preprocessing::denoise(&binary, self.median_radius);
        let edges = preprocessing::detect_edges(&denoised, self.canny_low, self.canny_high);

        let candidates = contours::find_candidates(&edges, self.min_contour_pixels);
        debug!("region extraction found {} contours", candidates.len());

        let frame_area = frame.width() * frame.height();
        self.select_candidate(&candidates, frame_area)
    }

    /// First candidate in scan order that passes the plate constraints.
    pub fn select_candidate(
        &self,
        candidates: &[PlateCandidate],
        frame_area: u32,
    ) -> Option<Region> {
        candidates
            .iter()
            .find(|c| self.qualifies(c, frame_area))
            .map(PlateCandidate::region)
    }

    fn qualifies(&self, candidate: &PlateCandidate, frame_area: u32) -> bool {
        let aspect = candidate.aspect_ratio();
        let area = candidate.area();
        aspect > self.min_aspect_ratio
            && aspect < self.max_aspect_ratio
            && area > self.min_area
            && area < frame_area / 2
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn candidate(label: u32, x: u32, y: u32, w: u32, h: u32) -> PlateCandidate {
        PlateCandidate {
            label,
            min_x: x,
            min_y: y,
            max_x: x + w - 1,
            max_y: y + h - 1,
            pixel_count: w * h,
        }
    }

    #[test]
    fn first_qualifying_candidate_wins_over_larger_later_one() {
        let extractor = RegionExtractor::new();
        let candidates = vec![
            candidate(1, 0, 0, 20, 20),    // square, rejected
            candidate(2, 10, 10, 120, 40), // qualifies (aspect 3.0, area 4800)
            candidate(3, 50, 50, 300, 100), // qualifies and larger, but later
        ];
        let selected = extractor.select_candidate(&candidates, 1920 * 1080).unwrap();
        assert_eq!(selected, candidates[1].region());
    }

    #[test]
    fn no_qualifying_candidate_returns_none() {
        let extractor = RegionExtractor::new();
        let candidates = vec![
            candidate(1, 0, 0, 20, 20),  // aspect 1.0
            candidate(2, 0, 0, 300, 10), // aspect 30.0
            candidate(3, 0, 0, 30, 10),  // area 300 < floor
        ];
        assert!(extractor.select_candidate(&candidates, 1920 * 1080).is_none());
    }

    #[test]
    fn near_frame_sized_candidate_is_rejected() {
        let extractor = RegionExtractor::new();
        let candidates = vec![candidate(1, 0, 0, 640, 250)]; // aspect ok but over half the frame
        assert!(extractor.select_candidate(&candidates, 640 * 480).is_none());
    }

    #[test]
    fn uniform_frame_falls_back_to_full_frame() {
        let extractor = RegionExtractor::new();
        let frame = Frame::new(DynamicImage::new_luma8(320, 240));
        assert!(extractor.extract(&frame).is_none());
    }
}
