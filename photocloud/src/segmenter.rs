use crate::background_exemplar::BackgroundExemplarMatcher;
use crate::edge_map::EdgeDetector;
use crate::raster_image::RasterImage;
use log::debug;
use serde::{Deserialize, Serialize};

/// Options controlling foreground/background classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationOptions {
    /// Edge-intensity cutoff in edge-aware mode, or the fraction of 255 used as the
    /// color-distance cutoff in color mode.
    pub threshold: f32,
    /// `true` selects edge-aware segmentation, `false` the corner-color fallback.
    pub edge_detection: bool,
}

impl Default for SegmentationOptions {
    fn default() -> Self {
        SegmentationOptions {
            threshold: 0.2,
            edge_detection: true,
        }
    }
}

/// Marks background pixels transparent on a working copy of the input.
///
/// Edge-aware mode keeps only pixels whose edge intensity reaches the threshold, which
/// assumes the object carries more local contrast than the backdrop. Flat object
/// interiors are therefore masked out as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    options: SegmentationOptions,
}

impl Segmenter {
    pub fn new(options: SegmentationOptions) -> Self {
        Segmenter { options }
    }

    /// Separates the object from the background of one view.
    ///
    /// With edge detection enabled, pixels whose Sobel intensity is below the threshold
    /// are background. Otherwise pixels within `threshold * 255` of the nearest corner
    /// color are background.
    ///
    /// # Parameters
    /// - `image`: The view to segment. It is not modified.
    ///
    /// # Returns
    /// A copy of `image` with alpha set to 0 on background pixels and left unchanged
    /// elsewhere.
    pub fn segment(&self, image: &RasterImage) -> RasterImage {
        let mut masked = image.clone();
        let transparent = if self.options.edge_detection {
            self.mask_by_edges(&mut masked)
        } else {
            self.mask_by_color(&mut masked)
        };
        debug!(
            "segmented {}x{} image: {} of {} pixels marked background",
            image.width,
            image.height,
            transparent,
            image.width * image.height
        );
        masked
    }

    fn mask_by_edges(&self, image: &mut RasterImage) -> usize {
        let edges = EdgeDetector::new().detect(image);
        let mut transparent = 0;
        for y in 0..image.height {
            for x in 0..image.width {
                if edges.get(x, y) < self.options.threshold {
                    image.set_alpha(x, y, 0);
                    transparent += 1;
                }
            }
        }
        transparent
    }

    fn mask_by_color(&self, image: &mut RasterImage) -> usize {
        let Some(matcher) = BackgroundExemplarMatcher::from_corners(image) else {
            return 0;
        };
        let max_distance = self.options.threshold * 255.0;
        let mut transparent = 0;
        for y in 0..image.height {
            for x in 0..image.width {
                if matcher.nearest_distance(image.get_rgb(x, y)) <= max_distance {
                    image.set_alpha(x, y, 0);
                    transparent += 1;
                }
            }
        }
        transparent
    }
}
