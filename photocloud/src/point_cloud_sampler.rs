use crate::density_grid::DensityGrid;
use crate::dimension_estimator::Dimensions;
use crate::feature_extractor::FeaturePoint;
use crate::point_cloud::PointCloudBuffer;
use crate::random_source::{weighted_index, RandomSource};
use crate::surface_extractor::{grid_to_object, is_surface_sufficient, SurfacePoint};
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Floor applied to feature-guided histogram bins so no bin has zero probability.
const HISTOGRAM_FLOOR: f32 = 0.01;

/// Half-width of the moving average applied to feature-guided histograms.
const HISTOGRAM_SMOOTHING_RADIUS: usize = 2;

/// Jitter span, in bins, for tightly clustered points.
const TIGHT_JITTER: f32 = 0.2;

/// Jitter span, in bins, for loosely scattered points.
const FULL_JITTER: f32 = 1.0;

/// Points whose sigmoid draw exceeds this are pulled toward the nearest face.
const SURFACE_PULL_THRESHOLD: f32 = 0.7;

/// Tunables for [PointCloudSampler].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    /// Number of points in the output cloud.
    pub point_count: usize,
    /// Share of points drawn from surface voxels in the surface-biased strategy.
    pub surface_ratio: f32,
    /// Share of feature-guided points that receive the tight jitter.
    pub tight_cluster_ratio: f32,
    /// Fraction of the remaining distance covered by the surface pull.
    pub surface_pull_strength: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        SamplingOptions {
            point_count: 5000,
            surface_ratio: 0.8,
            tight_cluster_ratio: 0.7,
            surface_pull_strength: 0.7,
        }
    }
}

/// Which strategy produced a point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Mostly resampled surface voxels, topped up from the density marginals.
    SurfaceBiased,
    /// Per-axis histograms built from the 2D features, with a depth prior.
    FeatureGuided,
}

/// Draws a fixed-size point cloud from the density field and its surface voxels.
///
/// Output is random by design: two calls with the same inputs give different clouds
/// unless the caller supplies a deterministic [RandomSource].
#[derive(Debug, Clone, Copy, Default)]
pub struct PointCloudSampler {
    options: SamplingOptions,
}

impl PointCloudSampler {
    pub fn new(options: SamplingOptions) -> Self {
        PointCloudSampler { options }
    }

    /// Strategy [PointCloudSampler::sample] will use for `surface_count` surface voxels.
    pub fn choose_strategy(&self, surface_count: usize) -> SamplingStrategy {
        if surface_count > 0 && is_surface_sufficient(surface_count, self.options.point_count) {
            SamplingStrategy::SurfaceBiased
        } else {
            SamplingStrategy::FeatureGuided
        }
    }

    /// Produces the final point cloud, picking the strategy from the surface size.
    ///
    /// # Parameters
    /// - `surface`: Surface voxel centres in object coordinates.
    /// - `grid`: The smoothed density field the surface was extracted from.
    /// - `features`: Pooled features with normalized coordinates (see
    ///   [FeaturePoint::normalized]).
    /// - `dimensions`: Object extents in mm; every point lies inside this box.
    /// - `random`: Source of uniform draws.
    ///
    /// # Returns
    /// Exactly `point_count` points and the strategy that produced them.
    pub fn sample<R: RandomSource + ?Sized>(
        &self,
        surface: &[SurfacePoint],
        grid: &DensityGrid,
        features: &[FeaturePoint],
        dimensions: &Dimensions,
        random: &mut R,
    ) -> (PointCloudBuffer, SamplingStrategy) {
        let strategy = self.choose_strategy(surface.len());
        let cloud = match strategy {
            SamplingStrategy::SurfaceBiased => {
                info!(
                    "sampling {} points from {} surface voxels",
                    self.options.point_count,
                    surface.len()
                );
                self.sample_surface_biased(surface, grid, dimensions, random)
            }
            SamplingStrategy::FeatureGuided => {
                warn!(
                    "only {} surface voxels for {} points, using feature-guided sampling",
                    surface.len(),
                    self.options.point_count
                );
                self.sample_feature_guided(grid.size(), features, dimensions, random)
            }
        };
        (cloud, strategy)
    }

    /// Resamples surface voxels with replacement, then fills the remainder from the
    /// per-axis marginals of the density grid.
    pub fn sample_surface_biased<R: RandomSource + ?Sized>(
        &self,
        surface: &[SurfacePoint],
        grid: &DensityGrid,
        dimensions: &Dimensions,
        random: &mut R,
    ) -> PointCloudBuffer {
        let total = self.options.point_count;
        let mut cloud = PointCloudBuffer::with_capacity(total);
        let from_surface = if surface.is_empty() {
            0
        } else {
            ((total as f32 * self.options.surface_ratio.clamp(0.0, 1.0)) as usize).min(total)
        };

        for _ in 0..from_surface {
            cloud.push(surface[random.index(surface.len())]);
        }

        let n = grid.size().max(1);
        let marginals = [grid.marginal(0), grid.marginal(1), grid.marginal(2)];
        if from_surface < total && marginals.iter().any(|m| m.iter().all(|w| *w <= 0.0)) {
            warn!("density grid has an empty marginal, filling uniformly along that axis");
        }
        for _ in from_surface..total {
            let mut coords = [0.0f32; 3];
            for (axis, coord) in coords.iter_mut().enumerate() {
                let bin = weighted_index(&marginals[axis], random);
                let offset = random.uniform();
                *coord = grid_to_object(bin as f32 + offset, n, dimensions.extent(axis));
            }
            cloud.push(Point3::from(coords));
        }
        cloud
    }

    /// Samples each axis from a 1D histogram: x and y from the feature projections,
    /// z from a bell-shaped prior centered on the middle of the grid.
    pub fn sample_feature_guided<R: RandomSource + ?Sized>(
        &self,
        grid_size: usize,
        features: &[FeaturePoint],
        dimensions: &Dimensions,
        random: &mut R,
    ) -> PointCloudBuffer {
        let n = grid_size.max(1);
        let histograms = [
            feature_histogram(features.iter().map(|f| (f.x, f.confidence)), n),
            feature_histogram(features.iter().map(|f| (f.y, f.confidence)), n),
            depth_prior(n),
        ];
        let half_extents = Vector3::new(
            dimensions.width / 2.0,
            dimensions.height / 2.0,
            dimensions.depth / 2.0,
        );

        let total = self.options.point_count;
        let mut cloud = PointCloudBuffer::with_capacity(total);
        for _ in 0..total {
            let jitter = if random.uniform() < self.options.tight_cluster_ratio {
                TIGHT_JITTER
            } else {
                FULL_JITTER
            };

            let mut coords = [0.0f32; 3];
            for (axis, coord) in coords.iter_mut().enumerate() {
                let bin = weighted_index(&histograms[axis], random);
                let offset = 0.5 + (random.uniform() - 0.5) * jitter;
                *coord = grid_to_object(bin as f32 + offset, n, dimensions.extent(axis));
            }
            let mut point = Point3::from(coords);

            if sigmoid(random.uniform() * 4.0 - 2.0) > SURFACE_PULL_THRESHOLD {
                point = pull_toward_surface(
                    point,
                    &half_extents,
                    self.options.surface_pull_strength,
                );
            }
            cloud.push(point);
        }
        cloud
    }
}

fn sigmoid(t: f32) -> f32 {
    1.0 / (1.0 + (-t).exp())
}

/// Moves `point` part of the way to the nearest box face along its dominant axis,
/// the axis where the point sits furthest out relative to the half-extent.
pub fn pull_toward_surface(
    point: Point3<f32>,
    half_extents: &Vector3<f32>,
    strength: f32,
) -> Point3<f32> {
    let mut dominant = 0;
    let mut best = f32::NEG_INFINITY;
    for axis in 0..3 {
        if half_extents[axis] <= 0.0 {
            continue;
        }
        let magnitude = (point[axis] / half_extents[axis]).abs();
        if magnitude > best {
            best = magnitude;
            dominant = axis;
        }
    }
    if best == f32::NEG_INFINITY {
        return point;
    }

    let face = half_extents[dominant].copysign(point[dominant]);
    let mut pulled = point;
    pulled[dominant] += (face - point[dominant]) * strength;
    pulled
}

/// Confidence-weighted histogram of normalized coordinates, smoothed with a moving
/// average and floored so every bin stays reachable.
fn feature_histogram(values: impl Iterator<Item = (f32, f32)>, bins: usize) -> Vec<f32> {
    let mut raw = vec![0.0f32; bins];
    for (position, weight) in values {
        let bin = ((position.clamp(0.0, 1.0) * bins as f32) as usize).min(bins - 1);
        raw[bin] += weight.max(0.0);
    }

    (0..bins)
        .map(|i| {
            let lo = i.saturating_sub(HISTOGRAM_SMOOTHING_RADIUS);
            let hi = (i + HISTOGRAM_SMOOTHING_RADIUS).min(bins - 1);
            let window = &raw[lo..=hi];
            let mean = window.iter().sum::<f32>() / window.len() as f32;
            mean.max(HISTOGRAM_FLOOR)
        })
        .collect()
}

/// `exp(-((pos - 0.5) * 2)^2)` evaluated at bin centers.
fn depth_prior(bins: usize) -> Vec<f32> {
    (0..bins)
        .map(|i| {
            let position = (i as f32 + 0.5) / bins as f32;
            let t = (position - 0.5) * 2.0;
            (-(t * t)).exp()
        })
        .collect()
}
