use thiserror::Error;

/// Errors raised at the edges of the pipeline.
///
/// The analysis stages themselves never fail: degenerate input resolves to fallback
/// values. Only raster construction, configuration and export can return these.
#[derive(Debug, Error)]
pub enum PhotoCloudError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pixel buffer holds {actual} bytes, expected {expected} for a {width}x{height} RGBA image")]
    InvalidBufferLength {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
