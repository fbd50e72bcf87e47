use crate::models::Region;
use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::HashMap;

/// Bounding box of one external contour in an edge image.
#[derive(Debug, Clone)]
pub struct PlateCandidate {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl PlateCandidate {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn region(&self) -> Region {
        Region {
            x: self.min_x,
            y: self.min_y,
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.region().aspect_ratio()
    }

    /// Bounding-rectangle area in px².
    pub fn area(&self) -> u32 {
        self.region().area()
    }
}

/// Find contour bounding boxes in a binary edge image using connected
/// components. Candidates come back sorted by label, which is the order
/// components are first encountered in a raster scan — callers rely on
/// this as the contour-scan order.
pub fn find_candidates(edges: &GrayImage, min_pixels: u32) -> Vec<PlateCandidate> {
    // Label connected components (white pixels = edges)
    let labeled = connected_components(edges, Connectivity::Eight, Luma([0]));

    let mut regions: HashMap<u32, (u32, u32, u32, u32, u32)> = HashMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }

        regions
            .entry(label_val)
            .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert((x, y, x, y, 1));
    }

    let mut candidates: Vec<PlateCandidate> = regions
        .into_iter()
        .map(
            |(label, (min_x, min_y, max_x, max_y, count))| PlateCandidate {
                label,
                min_x,
                min_y,
                max_x,
                max_y,
                pixel_count: count,
            },
        )
        .filter(|c| c.pixel_count >= min_pixels)
        .collect();

    // HashMap iteration order is arbitrary; restore scan order.
    candidates.sort_by_key(|c| c.label);
    candidates
}
