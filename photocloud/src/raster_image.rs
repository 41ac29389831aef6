use crate::error::PhotoCloudError;

/// A basic representation of an image with RGBA pixel data.
/// Each pixel occupies 4 bytes: R, G, B, and A (alpha), row-major with a top-left origin.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RasterImage {
    /// Pixel data stored in a 1D `Vec<u8>`, in RGBA format (4 bytes per pixel).
    pub img_data: Vec<u8>,
    /// The width (in pixels) of the image.
    pub width: usize,
    /// The height (in pixels) of the image.
    pub height: usize,
}

impl RasterImage {
    /// Wraps an existing RGBA buffer, checking that its length matches `width * height * 4`.
    pub fn from_rgba(width: usize, height: usize, img_data: Vec<u8>) -> Result<Self, PhotoCloudError> {
        let expected = width * height * 4;
        if img_data.len() != expected {
            return Err(PhotoCloudError::InvalidBufferLength {
                width,
                height,
                expected,
                actual: img_data.len(),
            });
        }
        Ok(RasterImage {
            img_data,
            width,
            height,
        })
    }

    /// Creates an opaque image where every pixel has the color `(r, g, b)`.
    pub fn filled(width: usize, height: usize, (r, g, b): (u8, u8, u8)) -> Self {
        let img_data = [r, g, b, 255].repeat(width * height);
        RasterImage {
            img_data,
            width,
            height,
        }
    }

    /// `true` when the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the `(R, G, B)` components at the pixel coordinate `(x, y)`.
    ///
    /// If `(x, y)` is out of bounds, this method returns `(0, 0, 0)`.
    pub fn get_rgb(&self, x: usize, y: usize) -> (u8, u8, u8) {
        if x >= self.width || y >= self.height {
            (0, 0, 0)
        } else {
            let index = (y * self.width + x) * 4;
            (
                self.img_data[index],
                self.img_data[index + 1],
                self.img_data[index + 2],
            )
        }
    }

    /// Sets the `(R, G, B)` components at `(x, y)`, leaving alpha untouched.
    /// Out-of-bounds writes are ignored.
    pub fn set_rgb(&mut self, x: usize, y: usize, (r, g, b): (u8, u8, u8)) {
        if x < self.width && y < self.height {
            let index = (y * self.width + x) * 4;
            self.img_data[index] = r;
            self.img_data[index + 1] = g;
            self.img_data[index + 2] = b;
        }
    }

    /// Alpha value at `(x, y)`, or 0 when out of bounds.
    pub fn get_alpha(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            0
        } else {
            self.img_data[(y * self.width + x) * 4 + 3]
        }
    }

    pub fn set_alpha(&mut self, x: usize, y: usize, alpha: u8) {
        if x < self.width && y < self.height {
            self.img_data[(y * self.width + x) * 4 + 3] = alpha;
        }
    }

    /// Grayscale intensity at `(x, y)` using luma weights `0.299 R + 0.587 G + 0.114 B`.
    pub fn luma(&self, x: usize, y: usize) -> f32 {
        let (r, g, b) = self.get_rgb(x, y);
        0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
    }

    /// Box-filters the image down to `new_width`, keeping the aspect ratio.
    ///
    /// Each output pixel is the mean RGBA of the source block it covers. Only shrinks:
    /// a zero or non-smaller width, or an empty image, returns an unchanged copy.
    pub fn get_scaled_proportional(&self, new_width: usize) -> RasterImage {
        if new_width == 0 || new_width >= self.width || self.is_empty() {
            return self.clone();
        }

        let scale_factor = new_width as f32 / self.width as f32;
        let new_height = ((self.height as f32 * scale_factor).round() as usize).max(1);

        let mut new_img_data = vec![0u8; new_width * new_height * 4];

        for new_y in 0..new_height {
            for new_x in 0..new_width {
                // Block of source pixels covered by this destination pixel.
                let orig_x_start = (((new_x as f32) / scale_factor).round() as usize).min(self.width - 1);
                let orig_y_start = (((new_y as f32) / scale_factor).round() as usize).min(self.height - 1);
                let orig_x_end = (((new_x + 1) as f32) / scale_factor).round() as usize;
                let orig_y_end = (((new_y + 1) as f32) / scale_factor).round() as usize;
                let orig_x_end = orig_x_end.min(self.width - 1).max(orig_x_start);
                let orig_y_end = orig_y_end.min(self.height - 1).max(orig_y_start);

                let mut totals = [0u32; 4];
                let mut pixel_count: u32 = 0;

                for orig_y in orig_y_start..=orig_y_end {
                    for orig_x in orig_x_start..=orig_x_end {
                        let orig_index = (orig_y * self.width + orig_x) * 4;
                        for (channel, total) in totals.iter_mut().enumerate() {
                            *total += self.img_data[orig_index + channel] as u32;
                        }
                        pixel_count += 1;
                    }
                }

                let new_index = (new_y * new_width + new_x) * 4;
                for (channel, total) in totals.iter().enumerate() {
                    new_img_data[new_index + channel] = (total / pixel_count) as u8;
                }
            }
        }

        RasterImage {
            img_data: new_img_data,
            width: new_width,
            height: new_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_rejects_short_buffers() {
        let err = RasterImage::from_rgba(4, 4, vec![0; 10]).unwrap_err();
        assert!(matches!(
            err,
            PhotoCloudError::InvalidBufferLength { expected: 64, actual: 10, .. }
        ));
    }

    #[test]
    fn out_of_bounds_reads_are_safe() {
        let image = RasterImage::filled(2, 2, (10, 20, 30));
        assert_eq!(image.get_rgb(1, 1), (10, 20, 30));
        assert_eq!(image.get_rgb(2, 0), (0, 0, 0));
        assert_eq!(image.get_alpha(0, 5), 0);
    }

    #[test]
    fn luma_uses_rec601_weights() {
        let image = RasterImage::filled(1, 1, (255, 0, 0));
        assert!((image.luma(0, 0) - 0.299 * 255.0).abs() < 1e-3);
    }

    #[test]
    fn scaling_preserves_aspect_ratio_and_average_color() {
        let mut image = RasterImage::filled(40, 20, (0, 0, 0));
        for y in 0..20 {
            for x in 0..40 {
                image.set_rgb(x, y, (200, 100, 50));
            }
        }
        let scaled = image.get_scaled_proportional(10);
        assert_eq!((scaled.width, scaled.height), (10, 5));
        assert_eq!(scaled.get_rgb(3, 3), (200, 100, 50));
        assert_eq!(scaled.get_alpha(3, 3), 255);
    }

    #[test]
    fn scaling_up_is_a_no_op() {
        let image = RasterImage::filled(8, 8, (1, 2, 3));
        assert_eq!(image.get_scaled_proportional(16), image);
    }
}
