use crate::bounding_box::BoundingBox;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Physical object size in millimeters plus a confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    pub confidence: f32,
}

impl Dimensions {
    /// Returned whenever no view yields a usable detection or bounding box.
    pub const FALLBACK: Dimensions = Dimensions {
        width: 120.0,
        height: 80.0,
        depth: 50.0,
        confidence: 0.5,
    };

    pub fn new(width: f32, height: f32, depth: f32, confidence: f32) -> Self {
        Dimensions {
            width,
            height,
            depth,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Extent along `axis` (0 = width, 1 = height, 2 = depth).
    pub fn extent(&self, axis: usize) -> f32 {
        match axis {
            0 => self.width,
            1 => self.height,
            _ => self.depth,
        }
    }
}

/// Confidence reported when dimensions come from raw bounding boxes.
pub const BOUNDING_BOX_CONFIDENCE: f32 = 0.6;

/// Ratio of depth to width assumed when only one view is available.
pub const SINGLE_VIEW_DEPTH_RATIO: f32 = 0.8;

/// Known real-world sizes (width, height, depth in mm) keyed by class label.
const REFERENCE_OBJECTS: &[(&str, [f32; 3])] = &[
    ("cup", [80.0, 95.0, 80.0]),
    ("bottle", [70.0, 220.0, 70.0]),
    ("mug", [90.0, 100.0, 120.0]),
    ("can", [66.0, 122.0, 66.0]),
    ("book", [150.0, 230.0, 30.0]),
    ("phone", [75.0, 150.0, 8.0]),
    ("cell phone", [75.0, 150.0, 8.0]),
    ("laptop", [330.0, 230.0, 20.0]),
    ("keyboard", [440.0, 30.0, 130.0]),
    ("mouse", [65.0, 40.0, 115.0]),
    ("box", [200.0, 150.0, 100.0]),
    ("shoe", [100.0, 110.0, 280.0]),
    ("vase", [120.0, 250.0, 120.0]),
    ("bowl", [160.0, 70.0, 160.0]),
    ("glasses", [140.0, 45.0, 150.0]),
    ("remote", [50.0, 20.0, 180.0]),
    ("plate", [260.0, 20.0, 260.0]),
];

fn reference_table() -> &'static HashMap<&'static str, [f32; 3]> {
    static TABLE: OnceLock<HashMap<&'static str, [f32; 3]>> = OnceLock::new();
    TABLE.get_or_init(|| REFERENCE_OBJECTS.iter().copied().collect())
}

/// Looks up the reference size for a class label, ignoring case and surrounding whitespace.
pub fn reference_size(label: &str) -> Option<[f32; 3]> {
    reference_table()
        .get(label.trim().to_lowercase().as_str())
        .copied()
}

/// A classifier result attached to one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Detection {
            label: label.into(),
            confidence,
        }
    }
}

/// What one photograph contributes to the size estimate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewAnalysis {
    pub bounding_box: BoundingBox,
    pub detection: Option<Detection>,
}

/// Combines per-view evidence into one [Dimensions] value.
///
/// Views whose detection matches the reference table are averaged, weighted by their
/// confidence. Without any match the bounding boxes are used directly. Never fails:
/// with nothing usable it returns [Dimensions::FALLBACK].
#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionEstimator;

impl DimensionEstimator {
    pub fn new() -> Self {
        DimensionEstimator
    }

    /// Estimates the object's size from all analysed views.
    ///
    /// # Parameters
    /// - `views`: Bounding box and optional detection for each view, in any order.
    ///   Views with an empty box or an unknown label are skipped.
    ///
    /// # Returns
    /// Reference-table dimensions when any label matches, else bounding-box dimensions
    /// with confidence 0.6, else [Dimensions::FALLBACK].
    pub fn estimate(&self, views: &[ViewAnalysis]) -> Dimensions {
        if let Some(dimensions) = self.estimate_from_references(views) {
            info!(
                "dimensions from reference objects: {:.1} x {:.1} x {:.1} mm (confidence {:.2})",
                dimensions.width, dimensions.height, dimensions.depth, dimensions.confidence
            );
            return dimensions;
        }
        if let Some(dimensions) = self.estimate_from_boxes(views) {
            info!(
                "dimensions from bounding boxes: {:.1} x {:.1} x {:.1}",
                dimensions.width, dimensions.height, dimensions.depth
            );
            return dimensions;
        }
        warn!(
            "no usable detections across {} views, using default dimensions",
            views.len()
        );
        Dimensions::FALLBACK
    }

    /// Confidence-weighted mean of the reference sizes of all matched views.
    pub fn estimate_from_references(&self, views: &[ViewAnalysis]) -> Option<Dimensions> {
        let matches: Vec<([f32; 3], f32)> = views
            .iter()
            .filter_map(|view| view.detection.as_ref())
            .filter_map(|detection| {
                let size = reference_size(&detection.label);
                if size.is_none() {
                    debug!("no reference size for label '{}'", detection.label);
                }
                size.map(|size| (size, detection.confidence.clamp(0.0, 1.0)))
            })
            .filter(|(_, confidence)| *confidence > 0.0)
            .collect();

        let total_weight: f32 = matches.iter().map(|(_, c)| c).sum();
        if matches.is_empty() || total_weight <= 0.0 {
            return None;
        }

        let mut combined = [0.0f32; 3];
        for (size, confidence) in &matches {
            for axis in 0..3 {
                combined[axis] += size[axis] * confidence;
            }
        }
        let max_confidence = matches.iter().map(|(_, c)| *c).fold(0.0, f32::max);

        Some(Dimensions::new(
            combined[0] / total_weight,
            combined[1] / total_weight,
            combined[2] / total_weight,
            max_confidence.min(1.0),
        ))
    }

    /// Largest box width and height; depth from the second-largest width when two or
    /// more non-empty views exist, otherwise a fixed fraction of the width.
    pub fn estimate_from_boxes(&self, views: &[ViewAnalysis]) -> Option<Dimensions> {
        let mut boxes: Vec<&BoundingBox> = views
            .iter()
            .map(|view| &view.bounding_box)
            .filter(|b| !b.is_empty())
            .collect();
        if boxes.is_empty() {
            return None;
        }

        boxes.sort_by(|a, b| b.width.cmp(&a.width));
        let width = boxes[0].width as f32;
        let height = boxes.iter().map(|b| b.height).max().unwrap_or(0) as f32;
        let depth = match boxes.get(1) {
            Some(second) => second.width as f32,
            None => width * SINGLE_VIEW_DEPTH_RATIO,
        };

        Some(Dimensions::new(width, height, depth, BOUNDING_BOX_CONFIDENCE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn boxed(width: usize, height: usize) -> ViewAnalysis {
        ViewAnalysis {
            bounding_box: BoundingBox {
                x: 0,
                y: 0,
                width,
                height,
            },
            detection: None,
        }
    }

    fn detected(label: &str, confidence: f32) -> ViewAnalysis {
        ViewAnalysis {
            bounding_box: BoundingBox::empty(),
            detection: Some(Detection::new(label, confidence)),
        }
    }

    #[test]
    fn no_views_yield_fallback() {
        assert_eq!(DimensionEstimator::new().estimate(&[]), Dimensions::FALLBACK);
        assert_eq!(
            Dimensions::FALLBACK,
            Dimensions {
                width: 120.0,
                height: 80.0,
                depth: 50.0,
                confidence: 0.5
            }
        );
    }

    #[test]
    fn only_empty_boxes_yield_fallback() {
        let views = vec![boxed(0, 30), boxed(40, 0), ViewAnalysis::default()];
        assert_eq!(DimensionEstimator::new().estimate(&views), Dimensions::FALLBACK);
    }

    #[test]
    fn single_confident_reference_is_identity() {
        let dims = DimensionEstimator::new().estimate(&[detected("cup", 1.0)]);
        assert_eq!(dims, Dimensions::new(80.0, 95.0, 80.0, 1.0));
    }

    #[test]
    fn references_are_confidence_weighted() {
        let views = vec![detected("cup", 0.25), detected("bottle", 0.75)];
        let dims = DimensionEstimator::new().estimate(&views);
        assert_relative_eq!(dims.width, 80.0 * 0.25 + 70.0 * 0.75, epsilon = 1e-4);
        assert_relative_eq!(dims.height, 95.0 * 0.25 + 220.0 * 0.75, epsilon = 1e-4);
        assert_relative_eq!(dims.depth, 80.0 * 0.25 + 70.0 * 0.75, epsilon = 1e-4);
        assert_relative_eq!(dims.confidence, 0.75);
    }

    #[test]
    fn label_lookup_ignores_case() {
        assert_eq!(reference_size(" Bottle "), Some([70.0, 220.0, 70.0]));
        assert_eq!(reference_size("spaceship"), None);
    }

    #[test]
    fn unknown_labels_fall_back_to_boxes() {
        let mut view = boxed(120, 60);
        view.detection = Some(Detection::new("spaceship", 0.9));
        let dims = DimensionEstimator::new().estimate(&[view]);
        assert_relative_eq!(dims.width, 120.0);
        assert_relative_eq!(dims.height, 60.0);
        assert_relative_eq!(dims.depth, 96.0);
    }

    #[test]
    fn boxes_use_max_extents_and_second_width_as_depth() {
        let views = vec![boxed(100, 40), boxed(0, 0), boxed(60, 90), boxed(80, 20)];
        let dims = DimensionEstimator::new().estimate(&views);
        assert_relative_eq!(dims.width, 100.0);
        assert_relative_eq!(dims.height, 90.0);
        assert_relative_eq!(dims.depth, 80.0);
        assert_relative_eq!(dims.confidence, BOUNDING_BOX_CONFIDENCE);
    }

    #[test]
    fn confidence_stays_in_unit_range() {
        let dims = DimensionEstimator::new().estimate(&[detected("can", 3.0)]);
        assert!(dims.confidence <= 1.0);
    }
}
