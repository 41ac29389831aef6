use crate::edge_map::{EdgeDetector, EdgeMap};
use crate::raster_image::RasterImage;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A local edge-response maximum. Coordinates are in pixels, or normalized to
/// [0, 1] once passed through [FeaturePoint::normalized].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeaturePoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl FeaturePoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        FeaturePoint { x, y, confidence }
    }

    /// Rescales pixel coordinates into [0, 1] relative to a `width` × `height` image.
    pub fn normalized(&self, width: usize, height: usize) -> FeaturePoint {
        FeaturePoint {
            x: if width > 0 { self.x / width as f32 } else { 0.0 },
            y: if height > 0 { self.y / height as f32 } else { 0.0 },
            confidence: self.confidence,
        }
    }
}

/// Tunables for [FeatureExtractor].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureOptions {
    /// Upper bound on the number of returned points.
    pub max_points: usize,
    /// Side of the square local-maximum window; also the excluded image border.
    pub window_size: usize,
    /// Minimum edge intensity for a candidate.
    pub min_intensity: f32,
}

impl Default for FeatureOptions {
    fn default() -> Self {
        FeatureOptions {
            max_points: 500,
            window_size: 5,
            min_intensity: 0.1,
        }
    }
}

/// Picks locally maximal edge responses, strongest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    options: FeatureOptions,
}

impl FeatureExtractor {
    pub fn new(options: FeatureOptions) -> Self {
        FeatureExtractor { options }
    }

    /// Extracts features from a masked raster. Pixels with alpha 0 never qualify.
    pub fn extract(&self, image: &RasterImage) -> Vec<FeaturePoint> {
        let mut edges = EdgeDetector::new().detect(image);
        for y in 0..image.height {
            for x in 0..image.width {
                if image.get_alpha(x, y) == 0 {
                    edges.set(x, y, 0.0);
                }
            }
        }
        self.extract_from_edges(&edges)
    }

    /// Extracts features directly from an edge map.
    ///
    /// Candidates are visited on a stride grid sized so large images stay cheap. A
    /// candidate survives unless some neighbor in its window is strictly greater, so
    /// flat plateaus can report several adjacent maxima.
    pub fn extract_from_edges(&self, edges: &EdgeMap) -> Vec<FeaturePoint> {
        let FeatureOptions {
            max_points,
            window_size,
            min_intensity,
        } = self.options;
        let (w, h) = (edges.width, edges.height);
        if max_points == 0 || w <= 2 * window_size || h <= 2 * window_size {
            return Vec::new();
        }

        let stride = usize::max(1, w * h / max_points / 10);
        let half = window_size / 2;

        let mut features = Vec::new();
        for y in (window_size..h - window_size).step_by(stride) {
            for x in (window_size..w - window_size).step_by(stride) {
                let value = edges.get(x, y);
                if value <= min_intensity {
                    continue;
                }
                if is_local_maximum(edges, x, y, half, value) {
                    features.push(FeaturePoint::new(x as f32, y as f32, value.min(1.0)));
                }
            }
        }

        // Stable sort keeps scan order among equal confidences.
        features.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        features.truncate(max_points);
        features
    }
}

fn is_local_maximum(edges: &EdgeMap, x: usize, y: usize, half: usize, value: f32) -> bool {
    for ny in y - half..=y + half {
        for nx in x - half..=x + half {
            if (nx, ny) != (x, y) && edges.get(nx, ny) > value {
                return false;
            }
        }
    }
    true
}
