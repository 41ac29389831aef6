use crate::density_grid::DensityGrid;
use crate::feature_extractor::FeaturePoint;
use log::info;
use serde::{Deserialize, Serialize};

/// Tunables for [DensityFieldBuilder].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityOptions {
    /// Cells per axis of the cubic grid.
    pub grid_size: usize,
    /// Half-width, in voxels, of the cubic splat neighborhood.
    pub splat_radius: usize,
    /// Share of the 27-cell neighborhood mean blended into each interior cell.
    pub smoothing_weight: f32,
}

impl Default for DensityOptions {
    fn default() -> Self {
        DensityOptions {
            grid_size: 20,
            splat_radius: 2,
            smoothing_weight: 0.3,
        }
    }
}

/// Splats normalized 2D features from every view into a 3D occupancy grid.
///
/// The photographs carry no per-point depth, so every feature is seeded on the middle
/// depth slice and only spreads in z through the splat kernel and the smoothing pass.
/// The resulting field is a deliberately depth-blind approximation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DensityFieldBuilder {
    options: DensityOptions,
}

impl DensityFieldBuilder {
    pub fn new(options: DensityOptions) -> Self {
        DensityFieldBuilder { options }
    }

    /// Builds the grid from features whose `x`/`y` are already normalized to [0, 1].
    pub fn build(&self, features: &[FeaturePoint]) -> DensityGrid {
        let mut grid = DensityGrid::new(self.options.grid_size);
        if self.options.grid_size == 0 {
            return grid;
        }

        for feature in features {
            self.splat(&mut grid, feature);
        }
        let smoothed = self.smooth(&grid);

        info!(
            "density field built from {} features ({}^3 cells, total weight {:.2})",
            features.len(),
            smoothed.size(),
            smoothed.total()
        );
        smoothed
    }

    fn splat(&self, grid: &mut DensityGrid, feature: &FeaturePoint) {
        let n = grid.size();
        let to_index = |v: f32| ((v.clamp(0.0, 1.0) * n as f32).floor() as usize).min(n - 1);
        let center = [to_index(feature.x), to_index(feature.y), n / 2];
        let radius = self.options.splat_radius as isize;
        let confidence = feature.confidence.max(0.0);

        for dx in -radius..=radius {
            for dy in -radius..=radius {
                for dz in -radius..=radius {
                    let cell = [
                        center[0] as isize + dx,
                        center[1] as isize + dy,
                        center[2] as isize + dz,
                    ];
                    if cell.iter().any(|&c| c < 0 || c >= n as isize) {
                        continue;
                    }
                    let distance = ((dx * dx + dy * dy + dz * dz) as f32).sqrt();
                    let weight = confidence * (-0.5 * distance).exp();
                    grid.accumulate(cell[0] as usize, cell[1] as usize, cell[2] as usize, weight);
                }
            }
        }
    }

    /// One pass blending each interior cell with the mean of its 27-cell neighborhood.
    /// Reads come from the unsmoothed input so the result does not depend on visit order.
    fn smooth(&self, grid: &DensityGrid) -> DensityGrid {
        let n = grid.size();
        let mut result = grid.clone();
        if n < 3 {
            return result;
        }
        let keep = 1.0 - self.options.smoothing_weight;

        for x in 1..n - 1 {
            for y in 1..n - 1 {
                for z in 1..n - 1 {
                    let mut sum = 0.0;
                    for nx in x - 1..=x + 1 {
                        for ny in y - 1..=y + 1 {
                            for nz in z - 1..=z + 1 {
                                sum += grid.value(nx, ny, nz);
                            }
                        }
                    }
                    let blended =
                        keep * grid.value(x, y, z) + self.options.smoothing_weight * sum / 27.0;
                    result.set(x, y, z, blended);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_features_give_empty_grid() {
        let grid = DensityFieldBuilder::default().build(&[]);
        assert_eq!(grid.size(), 20);
        assert_eq!(grid.total(), 0.0);
    }

    #[test]
    fn values_are_never_negative() {
        let features: Vec<FeaturePoint> = (0..40)
            .map(|i| FeaturePoint::new((i % 7) as f32 / 7.0, (i % 5) as f32 / 5.0, (i % 3) as f32 / 2.0))
            .collect();
        let grid = DensityFieldBuilder::default().build(&features);
        assert!(grid.cells().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn splat_peaks_on_the_middle_depth_slice() {
        let grid = DensityFieldBuilder::default().build(&[FeaturePoint::new(0.5, 0.5, 1.0)]);
        let mid = grid.value(10, 10, 10);
        assert!(mid > grid.value(10, 10, 8));
        assert!(mid > grid.value(12, 10, 10));
        assert_eq!(grid.value(10, 10, 14), 0.0);
    }

    #[test]
    fn splat_weight_follows_exponential_falloff() {
        let builder = DensityFieldBuilder::new(DensityOptions {
            smoothing_weight: 0.0,
            ..Default::default()
        });
        let grid = builder.build(&[FeaturePoint::new(0.5, 0.5, 0.8)]);
        assert_relative_eq!(grid.value(10, 10, 10), 0.8, epsilon = 1e-6);
        assert_relative_eq!(grid.value(11, 10, 10), 0.8 * (-0.5f32).exp(), epsilon = 1e-6);
        assert_relative_eq!(
            grid.value(12, 12, 12),
            0.8 * (-0.5 * 12f32.sqrt()).exp(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn features_at_the_edge_are_clipped_to_the_grid() {
        let grid = DensityFieldBuilder::default().build(&[FeaturePoint::new(1.0, 0.0, 1.0)]);
        assert!(grid.value(19, 0, 10) > 0.0);
        assert!(grid.total().is_finite());
    }

    #[test]
    fn build_is_deterministic() {
        let features = vec![
            FeaturePoint::new(0.2, 0.3, 0.9),
            FeaturePoint::new(0.7, 0.6, 0.4),
        ];
        let builder = DensityFieldBuilder::default();
        assert_eq!(builder.build(&features), builder.build(&features));
    }
}
