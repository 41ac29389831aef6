use crate::raster_image::RasterImage;
use kd_tree::{KdPoint, KdTree};

/// An RGB color sampled from the image as a background reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundExemplar {
    pub rgb: [i32; 3],
}

impl BackgroundExemplar {
    pub fn new((r, g, b): (u8, u8, u8)) -> Self {
        BackgroundExemplar {
            rgb: [r as i32, g as i32, b as i32],
        }
    }

    /// Euclidean RGB distance to `other`.
    pub fn distance(&self, other: &BackgroundExemplar) -> f32 {
        let squared: i32 = self
            .rgb
            .iter()
            .zip(other.rgb.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        (squared as f32).sqrt()
    }
}

impl KdPoint for BackgroundExemplar {
    type Scalar = i32;
    type Dim = typenum::U3;
    fn at(&self, k: usize) -> i32 {
        self.rgb[k]
    }
}

/// Nearest-color lookup over the background exemplars of one image.
///
/// The exemplars are the four corner pixels. A [KdTree] answers "which background
/// color is closest to this pixel" without scanning every exemplar.
pub struct BackgroundExemplarMatcher {
    kdtree: KdTree<BackgroundExemplar>,
}

impl BackgroundExemplarMatcher {
    /// Samples the four corners of `image`. Returns `None` for an empty image.
    pub fn from_corners(image: &RasterImage) -> Option<Self> {
        if image.is_empty() {
            return None;
        }
        let right = image.width - 1;
        let bottom = image.height - 1;
        let exemplars = vec![
            BackgroundExemplar::new(image.get_rgb(0, 0)),
            BackgroundExemplar::new(image.get_rgb(right, 0)),
            BackgroundExemplar::new(image.get_rgb(0, bottom)),
            BackgroundExemplar::new(image.get_rgb(right, bottom)),
        ];
        Some(BackgroundExemplarMatcher {
            kdtree: KdTree::build(exemplars),
        })
    }

    /// Distance from `rgb` to the closest background exemplar.
    pub fn nearest_distance(&self, rgb: (u8, u8, u8)) -> f32 {
        let query = BackgroundExemplar::new(rgb);
        match self.kdtree.nearest(&query) {
            Some(found) => found.item.distance(&query),
            None => f32::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_distance_picks_closest_corner() {
        let mut image = RasterImage::filled(5, 5, (0, 0, 0));
        image.set_rgb(4, 4, (200, 0, 0));
        let matcher = BackgroundExemplarMatcher::from_corners(&image).unwrap();
        assert_eq!(matcher.nearest_distance((0, 0, 0)), 0.0);
        assert!((matcher.nearest_distance((190, 0, 0)) - 10.0).abs() < 1e-4);
        assert!((matcher.nearest_distance((0, 30, 40)) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn empty_image_has_no_exemplars() {
        assert!(BackgroundExemplarMatcher::from_corners(&RasterImage::default()).is_none());
    }
}
