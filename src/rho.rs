use crate::error::{ForestRiskError, Result};
use crate::io::Region;
use gdal::raster::Buffer;
use gdal::DriverManager;
use log::info;
use ndarray::Array2;
use std::path::Path;

const RHO_NODATA: f64 = -9999.0;

/// Overview cascade for the rho raster.
const RHO_OVERVIEW_LEVELS: [i32; 5] = [2, 4, 8, 16, 32];

/// Write spatial random-effect values to their own raster.
///
/// The values are laid out row-major on a coarse grid of `cell_size_km` cells
/// covering the reference region: `rho[i]` lands at cell
/// `(i % ncell_x, i / ncell_x)` where `ncell_x = ceil(extent_x / cell_size)`.
/// The output is a float64 GeoTIFF at the coarse resolution, carrying the
/// reference projection and origin, with statistics and averaged overviews.
pub fn write_rho_raster<P, Q>(
    rho: &[f64],
    reference_raster: P,
    cell_size_km: f64,
    output_file: Q,
) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    if cell_size_km <= 0.0 {
        return Err(ForestRiskError::InvalidCellSize(cell_size_km));
    }

    let region = Region::from_raster(reference_raster)?;

    // Cell size in the region's linear unit (metres).
    let csize = cell_size_km * 1000.0;
    let ncell_x = ((region.xmax() - region.xmin()) / csize).ceil() as usize;
    let ncell_y = ((region.ymax() - region.ymin()) / csize).ceil() as usize;

    let expected = ncell_x * ncell_y;
    if rho.len() != expected {
        return Err(ForestRiskError::RhoLengthMismatch {
            expected,
            actual: rho.len(),
        });
    }

    let grid = Array2::from_shape_vec((ncell_y, ncell_x), rho.to_vec())?;

    info!(
        "Writing {}x{} rho grid to {}",
        ncell_x,
        ncell_y,
        output_file.as_ref().display()
    );

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset =
        driver.create_with_band_type::<f64, _>(output_file.as_ref(), ncell_x, ncell_y, 1)?;

    // Reference origin and projection, coarse resolution.
    let mut geo_transform = region.geo_transform;
    geo_transform[1] = csize;
    geo_transform[5] = -csize;
    dataset.set_geo_transform(&geo_transform)?;
    dataset.set_projection(&region.projection)?;

    {
        let mut band = dataset.rasterband(1)?;
        band.set_no_data_value(Some(RHO_NODATA))?;

        let slice = grid.as_slice().expect("rho grid must be contiguous");
        let mut buffer = Buffer::new((ncell_x, ncell_y), slice.to_vec());
        band.write((0, 0), (ncell_x, ncell_y), &mut buffer)?;

        info!("Computing statistics");
        band.get_statistics(true, false)?;
    }

    info!("Building overviews (average, levels {:?})", RHO_OVERVIEW_LEVELS);
    dataset.build_overviews("AVERAGE", &RHO_OVERVIEW_LEVELS, &[])?;

    dataset.flush_cache()?;
    Ok(())
}
