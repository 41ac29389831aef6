use clap::Parser;
use image::{open, GenericImageView};
use log::{error, info};
use photocloud::point_cloud_processor::ReconstructionResult;
use photocloud::{
    Detection, PhotoCloudError, PipelineConfig, PointCloudProcessor, RasterImage, ViewInput,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Command line arguments structure.
#[derive(Parser, Debug)]
#[command(author, version, about = "Estimate object dimensions and a preview point cloud from photos.")]
struct Args {
    /// Photo filenames, one per view
    #[arg(required = true)]
    photos: Vec<PathBuf>,

    /// Object class label per view (e.g. "cup"), in the same order as the photos
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Classifier confidence applied to every label
    #[arg(long, default_value_t = 0.9)]
    label_confidence: f32,

    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of points to generate
    #[arg(long)]
    point_count: Option<usize>,

    /// Cells per axis of the density grid
    #[arg(long)]
    grid_size: Option<usize>,

    /// Segmentation threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Segment by corner colors instead of edge intensity
    #[arg(long)]
    color_segmentation: bool,

    /// Downscale photos wider than this before analysis
    #[arg(long)]
    max_image_width: Option<usize>,

    /// Seed for reproducible point clouds
    #[arg(long)]
    seed: Option<u64>,

    /// Write the point cloud as a Wavefront OBJ vertex list
    #[arg(long)]
    output_obj: Option<PathBuf>,

    /// Write the point cloud as ASCII PLY
    #[arg(long)]
    output_ply: Option<PathBuf>,

    /// Write the point cloud as an X3D PointSet document
    #[arg(long)]
    output_x3d: Option<PathBuf>,

    /// Write a JSON report with dimensions and pipeline statistics
    #[arg(long)]
    output_json: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Args::parse()) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;

    let mut views = Vec::with_capacity(args.photos.len());
    for (i, path) in args.photos.iter().enumerate() {
        let image = read_photo(path)?;
        let view = match args.labels.get(i) {
            Some(label) => {
                ViewInput::with_detection(image, Detection::new(label.as_str(), args.label_confidence))
            }
            None => ViewInput::new(image),
        };
        views.push(view);
    }

    let processor = PointCloudProcessor::new(config);
    info!(
        "Reconstructing {} views: grid {}, {} points, {} segmentation",
        views.len(),
        processor.config().density.grid_size,
        processor.config().sampling.point_count,
        if processor.config().segmentation.edge_detection { "edge" } else { "color" }
    );
    let result = match args.seed {
        Some(seed) => processor.process(&views, &mut StdRng::seed_from_u64(seed)),
        None => processor.process(&views, &mut rand::thread_rng()),
    };

    let dims = result.dimensions;
    println!(
        "Dimensions: {:.1} x {:.1} x {:.1} mm (confidence {:.2})",
        dims.width, dims.height, dims.depth, dims.confidence
    );
    println!(
        "Point cloud: {} points ({:?})",
        result.point_cloud.len(),
        result.strategy
    );

    write_outputs(&args, &result)?;
    Ok(())
}

fn build_config(args: &Args) -> Result<PipelineConfig, PhotoCloudError> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(point_count) = args.point_count {
        config.sampling.point_count = point_count;
    }
    if let Some(grid_size) = args.grid_size {
        config.density.grid_size = grid_size;
    }
    if let Some(threshold) = args.threshold {
        config.segmentation.threshold = threshold;
    }
    if args.color_segmentation {
        config.segmentation.edge_detection = false;
    }
    if args.max_image_width.is_some() {
        config.max_image_width = args.max_image_width;
    }
    config.validate()?;
    Ok(config)
}

fn write_outputs(args: &Args, result: &ReconstructionResult) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &args.output_obj {
        result.point_cloud.write_obj(&mut create(path)?)?;
        info!("OBJ written to {}", path.display());
    }
    if let Some(path) = &args.output_ply {
        result.point_cloud.write_ply(&mut create(path)?)?;
        info!("PLY written to {}", path.display());
    }
    if let Some(path) = &args.output_x3d {
        result.point_cloud.write_x3d(&mut create(path)?)?;
        info!("X3D written to {}", path.display());
    }
    if let Some(path) = &args.output_json {
        let mut writer = create(path)?;
        serde_json::to_writer_pretty(&mut writer, &result.report())?;
        writer.flush()?;
        info!("JSON report written to {}", path.display());
    }
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, PhotoCloudError> {
    Ok(BufWriter::new(File::create(path)?))
}

pub fn read_photo(path: &Path) -> Result<RasterImage, Box<dyn std::error::Error>> {
    info!("Reading image file: {}", path.display());
    let img = open(path)?;
    let (width, height) = img.dimensions();
    let raster = RasterImage::from_rgba(width as usize, height as usize, img.to_rgba8().into_raw())?;
    Ok(raster)
}
