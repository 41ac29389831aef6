use crate::bounding_box::BoundingBox;
use crate::density_field::DensityFieldBuilder;
use crate::density_grid::DensityGrid;
use crate::dimension_estimator::{Detection, DimensionEstimator, Dimensions, ViewAnalysis};
use crate::feature_extractor::{FeatureExtractor, FeaturePoint};
use crate::pipeline_config::PipelineConfig;
use crate::point_cloud::PointCloudBuffer;
use crate::point_cloud_sampler::{PointCloudSampler, SamplingStrategy};
use crate::random_source::RandomSource;
use crate::raster_image::RasterImage;
use crate::segmenter::Segmenter;
use crate::surface_extractor::SurfaceExtractor;
use log::{debug, info};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One photograph plus the optional classifier result for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewInput {
    pub image: RasterImage,
    pub detection: Option<Detection>,
}

impl ViewInput {
    pub fn new(image: RasterImage) -> Self {
        ViewInput {
            image,
            detection: None,
        }
    }

    pub fn with_detection(image: RasterImage, detection: Detection) -> Self {
        ViewInput {
            image,
            detection: Some(detection),
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Segmentation,
    FeatureExtraction,
    DimensionEstimation,
    DensityField,
    SurfaceExtraction,
    Sampling,
    Completed,
}

impl PipelineStage {
    /// Fraction of the work done once this stage starts.
    pub fn progress(&self) -> f32 {
        match self {
            PipelineStage::Segmentation => 0.1,
            PipelineStage::FeatureExtraction => 0.2,
            PipelineStage::DimensionEstimation => 0.4,
            PipelineStage::DensityField => 0.6,
            PipelineStage::SurfaceExtraction => 0.8,
            PipelineStage::Sampling => 0.9,
            PipelineStage::Completed => 1.0,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PipelineStage::Segmentation => "Separating objects from background",
            PipelineStage::FeatureExtraction => "Extracting features from images",
            PipelineStage::DimensionEstimation => "Estimating object dimensions",
            PipelineStage::DensityField => "Building density field",
            PipelineStage::SurfaceExtraction => "Extracting surface voxels",
            PipelineStage::Sampling => "Sampling point cloud",
            PipelineStage::Completed => "Point cloud completed",
        }
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct ReconstructionResult {
    pub dimensions: Dimensions,
    pub point_cloud: PointCloudBuffer,
    pub strategy: SamplingStrategy,
    /// Per-view bounding boxes and detections, in input order.
    pub views: Vec<ViewAnalysis>,
    /// Normalized features pooled across all views.
    pub features: Vec<FeaturePoint>,
    pub surface_voxel_count: usize,
}

impl ReconstructionResult {
    pub fn report(&self) -> ReconstructionReport {
        let bounds = self.point_cloud.bounds();
        ReconstructionReport {
            dimensions: self.dimensions,
            point_count: self.point_cloud.len(),
            strategy: self.strategy,
            view_count: self.views.len(),
            bounding_boxes: self.views.iter().map(|v| v.bounding_box).collect(),
            feature_count: self.features.len(),
            surface_voxel_count: self.surface_voxel_count,
            bounds_min: bounds.map(|(min, _)| point_array(min)),
            bounds_max: bounds.map(|(_, max)| point_array(max)),
        }
    }
}

fn point_array(p: Point3<f32>) -> [f32; 3] {
    [p.x, p.y, p.z]
}

/// Serializable summary of a [ReconstructionResult], without the points themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionReport {
    pub dimensions: Dimensions,
    pub point_count: usize,
    pub strategy: SamplingStrategy,
    pub view_count: usize,
    pub bounding_boxes: Vec<BoundingBox>,
    pub feature_count: usize,
    pub surface_voxel_count: usize,
    pub bounds_min: Option<[f32; 3]>,
    pub bounds_max: Option<[f32; 3]>,
}

/// Runs the photo-to-point-cloud pipeline:
///
/// 1. **Segmentation** of every view into foreground and background.
/// 2. **Feature extraction** and bounding boxes on each masked view.
/// 3. **Dimension estimation** from reference labels or bounding boxes.
/// 4. **Density field** splatted from the features of all views.
/// 5. **Surface extraction** of dense, steep voxels.
/// 6. **Sampling** of the final fixed-size point cloud.
///
/// Holds only configuration, so one processor can serve any number of independent
/// runs, including from several threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointCloudProcessor {
    config: PipelineConfig,
}

impl PointCloudProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        PointCloudProcessor { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Scales `image` down to `max_image_width` when configured and needed.
    fn prepare_image<'a>(&self, image: &'a RasterImage) -> Cow<'a, RasterImage> {
        match self.config.max_image_width {
            Some(max_width) if image.width > max_width => {
                debug!("scaling {}x{} image to width {}", image.width, image.height, max_width);
                Cow::Owned(image.get_scaled_proportional(max_width))
            }
            _ => Cow::Borrowed(image),
        }
    }

    /// Segments one view, then measures its bounding box and extracts its features.
    ///
    /// # Returns
    /// The view's analysis and its features normalized to [0, 1].
    pub fn analyze_view(&self, view: &ViewInput) -> (ViewAnalysis, Vec<FeaturePoint>) {
        let image = self.prepare_image(&view.image);
        let masked = Segmenter::new(self.config.segmentation).segment(&image);
        self.analyze_masked(&masked, view.detection.clone())
    }

    fn analyze_masked(
        &self,
        masked: &RasterImage,
        detection: Option<Detection>,
    ) -> (ViewAnalysis, Vec<FeaturePoint>) {
        let bounding_box = BoundingBox::of_foreground(masked);
        let features: Vec<FeaturePoint> = FeatureExtractor::new(self.config.features)
            .extract(masked)
            .iter()
            .map(|f| f.normalized(masked.width, masked.height))
            .collect();
        debug!(
            "view {}x{}: box {:?}, {} features",
            masked.width,
            masked.height,
            bounding_box,
            features.len()
        );
        (
            ViewAnalysis {
                bounding_box,
                detection,
            },
            features,
        )
    }

    /// Estimates object dimensions without generating a point cloud.
    pub fn estimate_dimensions(&self, views: &[ViewInput]) -> Dimensions {
        let analyses: Vec<ViewAnalysis> = views.iter().map(|v| self.analyze_view(v).0).collect();
        DimensionEstimator::new().estimate(&analyses)
    }

    /// Builds the density grid for a pooled, normalized feature set.
    pub fn build_density_field(&self, features: &[FeaturePoint]) -> DensityGrid {
        DensityFieldBuilder::new(self.config.density).build(features)
    }

    /// Runs the full pipeline.
    pub fn process<R: RandomSource + ?Sized>(
        &self,
        views: &[ViewInput],
        random: &mut R,
    ) -> ReconstructionResult {
        self.process_with_progress(views, random, |_| {})
    }

    /// Runs the full pipeline, calling `on_stage` as each stage begins and once more
    /// with [PipelineStage::Completed].
    pub fn process_with_progress<R, F>(
        &self,
        views: &[ViewInput],
        random: &mut R,
        mut on_stage: F,
    ) -> ReconstructionResult
    where
        R: RandomSource + ?Sized,
        F: FnMut(PipelineStage),
    {
        let mut enter = |stage: PipelineStage| {
            info!("{} ({:.0}%)", stage.description(), stage.progress() * 100.0);
            on_stage(stage);
        };

        enter(PipelineStage::Segmentation);
        let segmenter = Segmenter::new(self.config.segmentation);
        let masked: Vec<RasterImage> = views
            .iter()
            .map(|view| segmenter.segment(&self.prepare_image(&view.image)))
            .collect();

        enter(PipelineStage::FeatureExtraction);
        let mut analyses = Vec::with_capacity(masked.len());
        let mut features = Vec::new();
        for (view, image) in views.iter().zip(&masked) {
            let (analysis, view_features) = self.analyze_masked(image, view.detection.clone());
            analyses.push(analysis);
            features.extend(view_features);
        }
        info!("{} features pooled from {} views", features.len(), views.len());

        enter(PipelineStage::DimensionEstimation);
        let dimensions = DimensionEstimator::new().estimate(&analyses);

        enter(PipelineStage::DensityField);
        let grid = self.build_density_field(&features);

        enter(PipelineStage::SurfaceExtraction);
        let surface = SurfaceExtractor::new(self.config.surface).extract(&grid, &dimensions);

        enter(PipelineStage::Sampling);
        let (point_cloud, strategy) = PointCloudSampler::new(self.config.sampling).sample(
            &surface,
            &grid,
            &features,
            &dimensions,
            random,
        );

        enter(PipelineStage::Completed);
        ReconstructionResult {
            dimensions,
            point_cloud,
            strategy,
            views: analyses,
            features,
            surface_voxel_count: surface.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_cloud_sampler::SamplingOptions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            sampling: SamplingOptions {
                point_count: 300,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn framed_square(size: usize) -> RasterImage {
        let mut image = RasterImage::filled(size, size, (0, 0, 0));
        for y in size / 4..size * 3 / 4 {
            for x in size / 4..size * 3 / 4 {
                image.set_rgb(x, y, (230, 230, 230));
            }
        }
        image
    }

    #[test]
    fn stages_are_reported_in_order() {
        let processor = PointCloudProcessor::new(small_config());
        let mut stages = Vec::new();
        let mut rng = StdRng::seed_from_u64(5);
        processor.process_with_progress(&[ViewInput::new(framed_square(40))], &mut rng, |s| {
            stages.push(s)
        });
        assert_eq!(stages.len(), 7);
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
        assert!(stages.windows(2).all(|w| w[0].progress() < w[1].progress()));
        assert_eq!(stages.last(), Some(&PipelineStage::Completed));
    }

    #[test]
    fn config_is_kept_as_given() {
        let processor = PointCloudProcessor::new(small_config());
        assert_eq!(processor.config(), &small_config());
        assert_eq!(processor.config().sampling.point_count, 300);
    }

    #[test]
    fn empty_input_still_produces_fallback_cloud() {
        let processor = PointCloudProcessor::new(small_config());
        let mut rng = StdRng::seed_from_u64(6);
        let result = processor.process(&[], &mut rng);
        assert_eq!(result.dimensions, Dimensions::FALLBACK);
        assert_eq!(result.point_cloud.len(), 300);
        assert_eq!(result.strategy, SamplingStrategy::FeatureGuided);
    }

    #[test]
    fn detection_overrides_bounding_boxes() {
        let processor = PointCloudProcessor::new(small_config());
        let view = ViewInput::with_detection(framed_square(40), Detection::new("cup", 1.0));
        let dims = processor.estimate_dimensions(&[view]);
        assert_eq!(dims, Dimensions::new(80.0, 95.0, 80.0, 1.0));
    }

    #[test]
    fn wide_images_are_scaled_before_analysis() {
        let processor = PointCloudProcessor::new(PipelineConfig {
            max_image_width: Some(20),
            ..small_config()
        });
        let (analysis, features) = processor.analyze_view(&ViewInput::new(framed_square(80)));
        assert!(analysis.bounding_box.width <= 20);
        assert!(features.iter().all(|f| (0.0..=1.0).contains(&f.x)));
    }

    #[test]
    fn report_summarises_result() {
        let processor = PointCloudProcessor::new(small_config());
        let mut rng = StdRng::seed_from_u64(7);
        let result = processor.process(&[ViewInput::new(framed_square(60))], &mut rng);
        let report = result.report();
        assert_eq!(report.point_count, 300);
        assert_eq!(report.view_count, 1);
        assert_eq!(report.feature_count, result.features.len());
        assert!(report.bounds_min.is_some());
    }
}
