#![allow(dead_code)]

use gdal::raster::Buffer;
use gdal::DriverManager;
use std::path::Path;

/// 30 m pixels, projected-metre style origin.
pub const GEO_TRANSFORM: [f64; 6] = [500_000.0, 30.0, 0.0, 6_000_000.0, 0.0, -30.0];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Write a single-band float32 GeoTIFF on the shared test grid.
pub fn write_f32_raster(
    path: &Path,
    ncol: usize,
    nrow: usize,
    data: Vec<f32>,
    nodata: Option<f64>,
) {
    assert_eq!(data.len(), ncol * nrow);
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f32, _>(path, ncol, nrow, 1)
        .unwrap();
    dataset.set_geo_transform(&GEO_TRANSFORM).unwrap();

    let mut band = dataset.rasterband(1).unwrap();
    if let Some(nd) = nodata {
        band.set_no_data_value(Some(nd)).unwrap();
    }
    let mut buffer = Buffer::new((ncol, nrow), data);
    band.write((0, 0), (ncol, nrow), &mut buffer).unwrap();
    drop(band);

    dataset.flush_cache().unwrap();
}

/// Write a single-band byte mask raster on the shared test grid.
pub fn write_u8_raster(path: &Path, ncol: usize, nrow: usize, data: Vec<u8>) {
    assert_eq!(data.len(), ncol * nrow);
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<u8, _>(path, ncol, nrow, 1)
        .unwrap();
    dataset.set_geo_transform(&GEO_TRANSFORM).unwrap();

    let mut band = dataset.rasterband(1).unwrap();
    let mut buffer = Buffer::new((ncol, nrow), data);
    band.write((0, 0), (ncol, nrow), &mut buffer).unwrap();
    drop(band);

    dataset.flush_cache().unwrap();
}

/// Read the full single band of a raster as `u16`.
pub fn read_u16_raster(path: &Path, ncol: usize, nrow: usize) -> Vec<u16> {
    let dataset = gdal::Dataset::open(path).unwrap();
    let band = dataset.rasterband(1).unwrap();
    band.read_as::<u16>((0, 0), (ncol, nrow), (ncol, nrow), None)
        .unwrap()
        .into_iter()
        .collect()
}
