use crate::error::{ForestRiskError, Result};
use crate::io::Region;
use crate::tiling::Tile;
use gdal::programs::raster::{build_vrt, BuildVRTOptions};
use gdal::Dataset;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

static VRT_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Ordered stack of single-band explanatory-variable rasters, exposed as one
/// multi-band in-memory VRT aligned on the Region grid.
///
/// Every band must declare a finite nodata value; validation happens at
/// construction, before any tile is read.
pub struct VariableStack {
    dataset: Dataset,
    names: Vec<String>,
    nodata: Vec<f64>,
}

impl VariableStack {
    /// Build the stack from all `*.tif` files in `var_dir`, sorted by name.
    /// A variable's name is its filename truncated at the first `.`.
    pub fn from_dir<P: AsRef<Path>>(var_dir: P, region: &Region) -> Result<Self> {
        let var_dir = var_dir.as_ref();
        let mut paths: Vec<PathBuf> = std::fs::read_dir(var_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("tif"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(ForestRiskError::NoVariableRasters(
                var_dir.display().to_string(),
            ));
        }

        let names: Vec<String> = paths.iter().map(|p| variable_name(p)).collect();
        info!("Stacking {} variable rasters: {:?}", paths.len(), names);

        let sources: Vec<Dataset> = paths
            .iter()
            .map(|p| Dataset::open(p))
            .collect::<std::result::Result<_, _>>()?;

        // Pin every source onto the reference grid so unrelated rasters line
        // up with the forest mask's geotransform.
        let args: Vec<String> = vec![
            "-separate".into(),
            "-resolution".into(),
            "user".into(),
            "-te".into(),
            region.xmin().to_string(),
            region.ymin().to_string(),
            region.xmax().to_string(),
            region.ymax().to_string(),
            "-tr".into(),
            region.xres().to_string(),
            region.yres().to_string(),
        ];
        let options = BuildVRTOptions::new(args)?;

        let vrt_path = format!(
            "/vsimem/forest_risk_stack_{}_{}.vrt",
            std::process::id(),
            VRT_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        debug!("Building virtual raster {}", vrt_path);
        let dataset = build_vrt(Some(Path::new(&vrt_path)), &sources, Some(options))?;

        let nodata = read_nodata_values(&dataset, &names)?;

        Ok(Self {
            dataset,
            names,
            nodata,
        })
    }

    pub fn band_count(&self) -> usize {
        self.names.len()
    }

    /// Variable names in band order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Declared nodata value per band, validated finite at construction.
    pub fn nodata(&self) -> &[f64] {
        &self.nodata
    }

    /// Read one tile window from every band: one (height * width) row-major
    /// buffer per band, in stack order.
    pub fn read_block(&self, tile: &Tile) -> Result<Vec<Vec<f32>>> {
        let mut bands = Vec::with_capacity(self.band_count());
        for k in 1..=self.band_count() {
            let band = self.dataset.rasterband(k)?;
            let buffer = band.read_as::<f32>(
                (tile.x_off as isize, tile.y_off as isize),
                (tile.width, tile.height),
                (tile.width, tile.height),
                None,
            )?;
            bands.push(buffer.into_iter().collect());
        }
        Ok(bands)
    }
}

/// Filename truncated at the first `.` ("dist_road.tif" -> "dist_road").
fn variable_name(path: &Path) -> String {
    let fname = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match fname.find('.') {
        Some(idx) => fname[..idx].to_string(),
        None => fname,
    }
}

fn read_nodata_values(dataset: &Dataset, names: &[String]) -> Result<Vec<f64>> {
    let mut nodata = Vec::with_capacity(names.len());
    for (k, name) in names.iter().enumerate() {
        let band = dataset.rasterband(k + 1)?;
        match band.no_data_value() {
            Some(nd) if !nd.is_nan() => nodata.push(nd),
            _ => return Err(ForestRiskError::MissingNodata(name.clone())),
        }
    }
    Ok(nodata)
}
