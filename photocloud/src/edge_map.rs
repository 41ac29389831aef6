use crate::raster_image::RasterImage;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Divisor mapping an 8-bit Sobel magnitude roughly into [0, 1].
/// Strong diagonal edges can land slightly above 1.
pub const EDGE_NORMALIZATION: f32 = 1448.0;

/// A `width` × `height` grid of normalized edge intensities.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    pub width: usize,
    pub height: usize,
    data: Vec<f32>,
}

impl EdgeMap {
    /// An all-zero map.
    pub fn new(width: usize, height: usize) -> Self {
        EdgeMap {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Intensity at `(x, y)`; zero outside the map.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        if x >= self.width || y >= self.height {
            0.0
        } else {
            self.data[y * self.width + x]
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Row-major view of all intensities.
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// Largest intensity in the map, 0 for an empty map.
    pub fn max_intensity(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }
}

/// Computes Sobel edge intensity maps from RGBA rasters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector;

impl EdgeDetector {
    pub fn new() -> Self {
        EdgeDetector
    }

    /// Runs the 3×3 Sobel operator over the luma channel of `image`.
    ///
    /// Only interior pixels are convolved; the outermost one-pixel ring stays at zero.
    /// Images smaller than 3×3 yield an all-zero map of the same size.
    pub fn detect(&self, image: &RasterImage) -> EdgeMap {
        let w = image.width;
        let h = image.height;
        let mut edges = EdgeMap::new(w, h);
        if w < 3 || h < 3 {
            return edges;
        }

        let gray: Vec<f32> = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| image.luma(x, y))
            .collect();

        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let at = |dx: usize, dy: usize| gray[(y + dy - 1) * w + x + dx - 1];
                // Opposite taps are differenced first so equal samples cancel to exactly 0.
                let mut sum_x = 0.0;
                let mut sum_y = 0.0;
                for k in 0..3 {
                    sum_x += SOBEL_KERNEL_X[k][2] * (at(2, k) - at(0, k));
                    sum_y += SOBEL_KERNEL_Y[2][k] * (at(k, 2) - at(k, 0));
                }
                let magnitude = (sum_x * sum_x + sum_y * sum_y).sqrt();
                edges.set(x, y, magnitude / EDGE_NORMALIZATION);
            }
        }

        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_step(width: usize, height: usize, split: usize) -> RasterImage {
        let mut image = RasterImage::filled(width, height, (0, 0, 0));
        for y in 0..height {
            for x in split..width {
                image.set_rgb(x, y, (255, 255, 255));
            }
        }
        image
    }

    #[test]
    fn output_matches_input_size_with_zero_border() {
        let image = vertical_step(12, 9, 6);
        let edges = EdgeDetector::new().detect(&image);
        assert_eq!((edges.width, edges.height), (12, 9));
        for x in 0..12 {
            assert_eq!(edges.get(x, 0), 0.0);
            assert_eq!(edges.get(x, 8), 0.0);
        }
        for y in 0..9 {
            assert_eq!(edges.get(0, y), 0.0);
            assert_eq!(edges.get(11, y), 0.0);
        }
    }

    #[test]
    fn uniform_image_has_no_edges() {
        for color in [(90, 140, 30), (17, 33, 201), (255, 255, 255), (1, 2, 3)] {
            let image = RasterImage::filled(16, 16, color);
            let edges = EdgeDetector::new().detect(&image);
            assert!(
                edges.values().iter().all(|&v| v == 0.0),
                "non-zero edge for {:?}: max {}",
                color,
                edges.max_intensity()
            );
        }
    }

    #[test]
    fn tiny_images_produce_all_zero_maps() {
        let image = vertical_step(2, 5, 1);
        let edges = EdgeDetector::new().detect(&image);
        assert_eq!(edges.values().len(), 10);
        assert_eq!(edges.max_intensity(), 0.0);
    }

    #[test]
    fn step_edge_responds_on_both_sides() {
        let image = vertical_step(10, 10, 5);
        let edges = EdgeDetector::new().detect(&image);
        let expected = 4.0 * 255.0 / EDGE_NORMALIZATION;
        assert!((edges.get(4, 5) - expected).abs() < 1e-3);
        assert!((edges.get(5, 5) - expected).abs() < 1e-3);
        assert_eq!(edges.get(2, 5), 0.0);
        assert_eq!(edges.get(7, 5), 0.0);
    }
}
