use crate::error::{ForestRiskError, Result};
use crate::tiling::Tile;
use gdal::cpl::CslStringList;
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use log::{debug, info};
use ndarray::Array2;
use std::path::Path;

/// Overview downsampling cascade for the prediction raster.
const PREDICTION_OVERVIEW_LEVELS: [i32; 4] = [4, 8, 16, 32];

/// The authoritative grid of a prediction run, derived from the forest-mask
/// raster. Every other raster is aligned onto this grid before tiling.
#[derive(Debug, Clone)]
pub struct Region {
    pub ncol: usize,
    pub nrow: usize,
    pub geo_transform: [f64; 6],
    pub projection: String,
}

impl Region {
    pub fn from_raster<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dataset = Dataset::open(path.as_ref())?;
        Self::from_dataset(&dataset)
    }

    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let (ncol, nrow) = dataset.raster_size();
        if ncol == 0 || nrow == 0 {
            return Err(ForestRiskError::InvalidDimensions(ncol, nrow));
        }

        let geo_transform = dataset.geo_transform()?;
        let region = Self {
            ncol,
            nrow,
            geo_transform,
            projection: dataset.projection(),
        };

        debug!(
            "Region: {}x{} pixels, extent ({:.6}, {:.6}) - ({:.6}, {:.6})",
            region.ncol,
            region.nrow,
            region.xmin(),
            region.ymin(),
            region.xmax(),
            region.ymax()
        );

        Ok(region)
    }

    /// West-east pixel size (positive).
    pub fn xres(&self) -> f64 {
        self.geo_transform[1].abs()
    }

    /// North-south pixel size (positive).
    pub fn yres(&self) -> f64 {
        self.geo_transform[5].abs()
    }

    pub fn xmin(&self) -> f64 {
        self.geo_transform[0]
    }

    pub fn xmax(&self) -> f64 {
        self.geo_transform[0] + self.geo_transform[1] * self.ncol as f64
    }

    pub fn ymax(&self) -> f64 {
        self.geo_transform[3]
    }

    pub fn ymin(&self) -> f64 {
        self.geo_transform[3] + self.geo_transform[5] * self.nrow as f64
    }
}

/// Streaming writer for the single-band uint16 probability raster.
///
/// Tiles are written incrementally; `finalize` must run exactly once, after
/// the last tile, to get correct statistics and overviews. Creation always
/// overwrites an existing file; there is no resumption of a partial run.
pub struct PredictionRaster {
    dataset: Dataset,
}

impl PredictionRaster {
    /// Create the output file on the Region grid: uint16, LZW-compressed with
    /// horizontal differencing, BigTIFF-capable, nodata 0.
    pub fn create<P: AsRef<Path>>(path: P, region: &Region) -> Result<Self> {
        info!("Creating prediction raster: {}", path.as_ref().display());

        let driver = DriverManager::get_driver_by_name("GTiff")?;

        let mut options = CslStringList::new();
        options.add_string("COMPRESS=LZW")?;
        options.add_string("PREDICTOR=2")?;
        options.add_string("BIGTIFF=YES")?;

        let mut dataset = driver.create_with_band_type_with_options::<u16, _>(
            path.as_ref(),
            region.ncol,
            region.nrow,
            1,
            &options,
        )?;

        dataset.set_geo_transform(&region.geo_transform)?;
        dataset.set_projection(&region.projection)?;

        let mut band = dataset.rasterband(1)?;
        band.set_no_data_value(Some(0.0))?;
        drop(band);

        Ok(Self { dataset })
    }

    /// Write one tile's worth of rescaled predictions at the tile offset.
    /// `data` is shaped (height, width).
    pub fn write_block(&mut self, tile: &Tile, data: &Array2<u16>) -> Result<()> {
        let (nrows, ncols) = data.dim();
        if nrows != tile.height || ncols != tile.width {
            return Err(ForestRiskError::BlockShapeMismatch {
                got_width: ncols,
                got_height: nrows,
                tile_width: tile.width,
                tile_height: tile.height,
            });
        }

        let slice = data.as_slice().expect("block array must be contiguous");
        let mut buffer = Buffer::new((tile.width, tile.height), slice.to_vec());

        let mut band = self.dataset.rasterband(1)?;
        band.write(
            (tile.x_off as isize, tile.y_off as isize),
            (tile.width, tile.height),
            &mut buffer,
        )?;

        debug!(
            "Wrote block at ({},{}) size {}x{}",
            tile.x_off, tile.y_off, tile.width, tile.height
        );

        Ok(())
    }

    /// Compute exact statistics over the fully-written raster, build the
    /// overview pyramid and release the dataset. Must be called after every
    /// tile has been written; earlier calls yield statistics over a partial
    /// raster.
    pub fn finalize(mut self) -> Result<()> {
        info!("Computing statistics");
        {
            let band = self.dataset.rasterband(1)?;
            band.get_statistics(true, false)?;
        }

        info!(
            "Building overviews (nearest, levels {:?})",
            PREDICTION_OVERVIEW_LEVELS
        );
        self.dataset
            .build_overviews("NEAREST", &PREDICTION_OVERVIEW_LEVELS, &[])?;

        self.dataset.flush_cache()?;
        Ok(())
    }
}
