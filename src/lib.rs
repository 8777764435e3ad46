// Library exports for the prediction pipeline and its collaborators.

pub mod error;
pub mod io;
pub mod model;
pub mod predict;
pub mod rho;
pub mod stack;
pub mod tiling;

// Re-export commonly used types
pub use error::{ForestRiskError, Result};
pub use io::{PredictionRaster, Region};
pub use model::{rescale, FeatureBlock, PredictOptions, ProbabilityModel, MAX_ENCODABLE};
pub use predict::predict_raster;
pub use rho::write_rho_raster;
pub use stack::VariableStack;
pub use tiling::{Tile, TileGrid};
