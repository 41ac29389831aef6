use crate::density_field::DensityOptions;
use crate::error::PhotoCloudError;
use crate::feature_extractor::FeatureOptions;
use crate::point_cloud_sampler::SamplingOptions;
use crate::segmenter::SegmentationOptions;
use crate::surface_extractor::SurfaceOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// All tunables of the pipeline. Every field has a default, so a JSON file only
/// needs to name the values it changes:
///
/// ```json
/// { "density": { "grid_size": 24 }, "sampling": { "point_count": 8000 } }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segmentation: SegmentationOptions,
    pub features: FeatureOptions,
    pub density: DensityOptions,
    pub surface: SurfaceOptions,
    pub sampling: SamplingOptions,
    /// Images wider than this are scaled down before analysis.
    pub max_image_width: Option<usize>,
}

impl PipelineConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, PhotoCloudError> {
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, PhotoCloudError> {
        let config: PipelineConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), PhotoCloudError> {
        let invalid = |msg: String| -> Result<(), PhotoCloudError> { Err(PhotoCloudError::InvalidConfig(msg)) };
        if self.density.grid_size < 3 {
            return invalid(format!(
                "density.grid_size must be at least 3, got {}",
                self.density.grid_size
            ));
        }
        if self.sampling.point_count == 0 {
            return invalid("sampling.point_count must be positive".to_string());
        }
        if self.features.window_size == 0 {
            return invalid("features.window_size must be positive".to_string());
        }
        if self.max_image_width == Some(0) {
            return invalid("max_image_width must be positive when set".to_string());
        }
        let ratios = [
            ("density.smoothing_weight", self.density.smoothing_weight),
            ("sampling.surface_ratio", self.sampling.surface_ratio),
            ("sampling.tight_cluster_ratio", self.sampling.tight_cluster_ratio),
            ("sampling.surface_pull_strength", self.sampling.surface_pull_strength),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{name} must lie in [0, 1], got {value}"));
            }
        }
        if self.segmentation.threshold < 0.0 {
            return invalid(format!(
                "segmentation.threshold must be non-negative, got {}",
                self.segmentation.threshold
            ));
        }
        Ok(())
    }
}
