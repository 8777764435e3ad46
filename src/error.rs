use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForestRiskError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("NoData value is missing or NaN for input band '{0}'")]
    MissingNodata(String),

    #[error("No variable rasters (*.tif) found in {0}")]
    NoVariableRasters(String),

    #[error("Raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error(
        "Block data {got_width}x{got_height} does not match tile {tile_width}x{tile_height}"
    )]
    BlockShapeMismatch {
        got_width: usize,
        got_height: usize,
        tile_width: usize,
        tile_height: usize,
    },

    #[error("Model returned {actual} predictions for {expected} valid pixels")]
    PredictionLength { expected: usize, actual: usize },

    #[error("Rho value count {actual} does not match grid size {expected}")]
    RhoLengthMismatch { expected: usize, actual: usize },

    #[error("Invalid cell size: {0} km (must be positive)")]
    InvalidCellSize(f64),

    #[error("Model prediction failed: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, ForestRiskError>;
