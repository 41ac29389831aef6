use crate::raster_image::RasterImage;
use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle. A box with zero width or height is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BoundingBox {
    pub fn empty() -> Self {
        BoundingBox::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scans `image` for the tight box around all pixels with non-zero alpha.
    ///
    /// Returns [BoundingBox::empty] when every pixel is transparent.
    pub fn of_foreground(image: &RasterImage) -> Self {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut found = false;

        for y in 0..image.height {
            for x in 0..image.width {
                if image.get_alpha(x, y) > 0 {
                    found = true;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        if !found {
            return BoundingBox::empty();
        }

        BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transparent(width: usize, height: usize) -> RasterImage {
        let mut image = RasterImage::filled(width, height, (0, 0, 0));
        for y in 0..height {
            for x in 0..width {
                image.set_alpha(x, y, 0);
            }
        }
        image
    }

    #[test]
    fn all_transparent_mask_yields_empty_box() {
        let bounds = BoundingBox::of_foreground(&transparent(16, 12));
        assert_eq!(bounds, BoundingBox::empty());
        assert!(bounds.is_empty());
    }

    #[test]
    fn box_spans_opaque_pixels_inclusively() {
        let mut image = transparent(20, 20);
        image.set_alpha(3, 5, 255);
        image.set_alpha(12, 9, 40);
        let bounds = BoundingBox::of_foreground(&image);
        assert_eq!(
            bounds,
            BoundingBox {
                x: 3,
                y: 5,
                width: 10,
                height: 5
            }
        );
    }

    #[test]
    fn single_pixel_is_a_one_by_one_box() {
        let mut image = transparent(4, 4);
        image.set_alpha(2, 1, 1);
        let bounds = BoundingBox::of_foreground(&image);
        assert_eq!((bounds.width, bounds.height), (1, 1));
        assert!(!bounds.is_empty());
    }
}
