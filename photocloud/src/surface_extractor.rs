use crate::density_grid::DensityGrid;
use crate::dimension_estimator::Dimensions;
use log::info;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A likely surface location in object space, in millimeters.
pub type SurfacePoint = Point3<f32>;

/// Thresholds for classifying a voxel as surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceOptions {
    pub density_threshold: f32,
    pub gradient_threshold: f32,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        SurfaceOptions {
            density_threshold: 0.2,
            gradient_threshold: 0.05,
        }
    }
}

/// Maps a (possibly fractional) grid coordinate to millimeters along one axis.
#[inline]
pub fn grid_to_object(position: f32, grid_size: usize, extent: f32) -> f32 {
    (position / grid_size as f32 - 0.5) * extent
}

/// Finds interior voxels that are both dense and on a steep density slope.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceExtractor {
    options: SurfaceOptions,
}

impl SurfaceExtractor {
    pub fn new(options: SurfaceOptions) -> Self {
        SurfaceExtractor { options }
    }

    /// Central-difference gradient magnitude at an interior cell.
    pub fn gradient_magnitude(grid: &DensityGrid, x: usize, y: usize, z: usize) -> f32 {
        let gx = (grid.value(x + 1, y, z) - grid.value(x - 1, y, z)).abs() / 2.0;
        let gy = (grid.value(x, y + 1, z) - grid.value(x, y - 1, z)).abs() / 2.0;
        let gz = (grid.value(x, y, z + 1) - grid.value(x, y, z - 1)).abs() / 2.0;
        (gx * gx + gy * gy + gz * gz).sqrt()
    }

    /// Returns the surface voxels of `grid` scaled into the box described by `dimensions`.
    pub fn extract(&self, grid: &DensityGrid, dimensions: &Dimensions) -> Vec<SurfacePoint> {
        let n = grid.size();
        let mut points = Vec::new();
        if n < 3 {
            return points;
        }

        for x in 1..n - 1 {
            for y in 1..n - 1 {
                for z in 1..n - 1 {
                    if grid.value(x, y, z) <= self.options.density_threshold {
                        continue;
                    }
                    if Self::gradient_magnitude(grid, x, y, z) <= self.options.gradient_threshold {
                        continue;
                    }
                    points.push(SurfacePoint::new(
                        grid_to_object(x as f32, n, dimensions.width),
                        grid_to_object(y as f32, n, dimensions.height),
                        grid_to_object(z as f32, n, dimensions.depth),
                    ));
                }
            }
        }

        info!("extracted {} surface voxels", points.len());
        points
    }
}

/// `true` when `surface_count` is enough to drive surface-biased sampling of
/// `target_points` points (at least half of the target).
pub fn is_surface_sufficient(surface_count: usize, target_points: usize) -> bool {
    surface_count * 2 >= target_points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_dimensions() -> Dimensions {
        Dimensions::new(100.0, 100.0, 100.0, 1.0)
    }

    #[test]
    fn flat_grid_has_no_surface() {
        let mut grid = DensityGrid::new(6);
        for x in 0..6 {
            for y in 0..6 {
                for z in 0..6 {
                    grid.set(x, y, z, 1.0);
                }
            }
        }
        assert!(SurfaceExtractor::default()
            .extract(&grid, &cube_dimensions())
            .is_empty());
    }

    #[test]
    fn dense_slab_boundary_is_surface() {
        let mut grid = DensityGrid::new(8);
        for x in 0..4 {
            for y in 0..8 {
                for z in 0..8 {
                    grid.set(x, y, z, 1.0);
                }
            }
        }
        let points = SurfaceExtractor::default().extract(&grid, &cube_dimensions());
        // Only x = 3 is dense with a non-zero x gradient.
        assert_eq!(points.len(), 6 * 6);
        assert!(points.iter().all(|p| (p.x - (3.0 / 8.0 - 0.5) * 100.0).abs() < 1e-4));
    }

    #[test]
    fn coordinates_are_centered_on_the_object() {
        assert_eq!(grid_to_object(10.0, 20, 80.0), 0.0);
        assert_eq!(grid_to_object(0.0, 20, 80.0), -40.0);
        assert_eq!(grid_to_object(20.0, 20, 80.0), 40.0);
    }

    #[test]
    fn sufficiency_needs_half_the_target() {
        assert!(is_surface_sufficient(2500, 5000));
        assert!(!is_surface_sufficient(2499, 5000));
    }

    #[test]
    fn extraction_is_deterministic() {
        let mut grid = DensityGrid::new(10);
        for i in 0..10 {
            grid.set(i, (i * 3) % 10, (i * 7) % 10, 0.5 + i as f32 * 0.1);
        }
        let extractor = SurfaceExtractor::default();
        let dims = Dimensions::new(40.0, 60.0, 20.0, 0.7);
        assert_eq!(extractor.extract(&grid, &dims), extractor.extract(&grid, &dims));
    }
}
