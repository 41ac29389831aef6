//! # PhotoCloud Library
//!
//! The `photocloud` library turns a handful of object photographs into an estimate of
//! the object's physical size and a synthetic 3D point cloud for preview rendering.
//! It is a heuristic approximation pipeline, not metric photogrammetry: the images
//! carry no depth signal, so depth is filled in with fixed priors.
//!
//! ## Overview of Modules
//!
//! - **`point_cloud_processor`**: Orchestrates the whole pipeline over a set of views and
//!   reports stage progress.
//!
//! - **`raster_image`**: Defines `RasterImage`, an RGBA pixel buffer with pixel access,
//!   luma conversion, and proportional downscaling.
//!
//! - **`edge_map`**: Sobel edge detection producing a normalized `EdgeMap`.
//!
//! - **`segmenter`**: Marks background pixels transparent, either from edge intensity or
//!   from the distance to the corner colors.
//!
//! - **`background_exemplar`** (private): Nearest-color lookup over the corner colors,
//!   used by the color-based segmenter.
//!
//! - **`bounding_box`**: Tight box around the foreground of a masked image.
//!
//! - **`feature_extractor`**: Locally maximal edge responses, ranked by confidence.
//!
//! - **`dimension_estimator`**: Combines reference-object sizes or bounding boxes from all
//!   views into one `Dimensions` value.
//!
//! - **`density_grid`**: A flat cubic grid of occupancy weights.
//!
//! - **`density_field`**: Splats pooled features into a `DensityGrid` and smooths it.
//!
//! - **`surface_extractor`**: Finds dense voxels on steep density slopes.
//!
//! - **`point_cloud_sampler`**: Draws the fixed-size point cloud, either surface-biased or
//!   feature-guided.
//!
//! - **`point_cloud`**: The flat coordinate buffer plus OBJ, PLY and X3D export.
//!
//! - **`random_source`**: The uniform-draw abstraction used for sampling.
//!
//! - **`pipeline_config`**: JSON-loadable configuration for every stage.

pub mod point_cloud_processor;

pub mod raster_image;
pub mod edge_map;
pub mod segmenter;
pub mod bounding_box;
pub mod feature_extractor;
pub mod dimension_estimator;
pub mod density_grid;
pub mod density_field;
pub mod surface_extractor;
pub mod point_cloud_sampler;
pub mod point_cloud;
pub mod random_source;
pub mod pipeline_config;
pub mod error;

// Internal Modules
mod background_exemplar;

pub use dimension_estimator::{Detection, Dimensions};
pub use error::PhotoCloudError;
pub use pipeline_config::PipelineConfig;
pub use point_cloud::PointCloudBuffer;
pub use point_cloud_processor::{PointCloudProcessor, ReconstructionResult, ViewInput};
pub use raster_image::RasterImage;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
