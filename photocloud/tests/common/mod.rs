use photocloud::{PipelineConfig, RasterImage};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Black `size`x`size` image with a white square covering `[start, end)` on both axes.
pub fn square_on_black(size: usize, start: usize, end: usize) -> RasterImage {
    let mut image = RasterImage::filled(size, size, (0, 0, 0));
    for y in start..end {
        for x in start..end {
            image.set_rgb(x, y, (255, 255, 255));
        }
    }
    image
}

/// Gray rectangle on a light backdrop, `w` by `h` pixels, centered.
pub fn rectangle_on_backdrop(size: usize, w: usize, h: usize) -> RasterImage {
    let mut image = RasterImage::filled(size, size, (240, 240, 235));
    let (x0, y0) = ((size - w) / 2, (size - h) / 2);
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            image.set_rgb(x, y, (60, 70, 80));
        }
    }
    image
}

pub fn config_with_points(point_count: usize) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.sampling.point_count = point_count;
    config
}
