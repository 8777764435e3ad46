use crate::error::{ForestRiskError, Result};
use crate::io::{PredictionRaster, Region};
use crate::model::{rescale, FeatureBlock, PredictOptions, ProbabilityModel};
use crate::stack::VariableStack;
use crate::tiling::TileGrid;
use gdal::Dataset;
use log::{debug, info};
use ndarray::Array2;
use std::path::Path;

/// Mask code for "forest present"; everything else is gated out.
const FOREST: f32 = 1.0;

/// Predict the spatial probability of deforestation over the whole region.
///
/// Reads the explanatory variables in `var_dir` (one single-band `*.tif` per
/// variable) and the forest mask, runs `model` block by block, and writes a
/// uint16 probability raster to `output_file` (0 = not predicted). Blocks are
/// `block_rows` rows high (`0` processes the raster in one block), so peak
/// memory stays at one block of bands regardless of raster size.
///
/// The output file is overwritten unconditionally; an interrupted run leaves
/// a partial raster without statistics or overviews and is restarted from
/// scratch, not resumed.
pub fn predict_raster<M, P, Q, R>(
    model: &M,
    var_dir: P,
    forest_mask: Q,
    output_file: R,
    block_rows: usize,
    opts: &PredictOptions,
) -> Result<()>
where
    M: ProbabilityModel + ?Sized,
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    // The forest mask defines the authoritative grid.
    let mask_dataset = Dataset::open(forest_mask.as_ref())?;
    let region = Region::from_dataset(&mask_dataset)?;

    // Fails fast on an empty directory or a band without nodata metadata,
    // before any output is created.
    let stack = VariableStack::from_dir(var_dir, &region)?;

    let grid = TileGrid::new(region.ncol, region.nrow, block_rows);
    info!("Dividing region into {} blocks", grid.len());

    let mut output = PredictionRaster::create(output_file, &region)?;

    let mut column_names: Vec<String> = stack.names().to_vec();
    column_names.push("fmask".to_string());

    let mask_band = mask_dataset.rasterband(1)?;

    for (idx, tile) in grid.iter() {
        info!("Predicting block {}/{}", idx + 1, grid.len());

        let bands = stack.read_block(&tile)?;
        let mask = mask_band
            .read_as::<f32>(
                (tile.x_off as isize, tile.y_off as isize),
                (tile.width, tile.height),
                (tile.width, tile.height),
                None,
            )?
            .into_iter()
            .collect::<Vec<f32>>();

        let valid = compute_valid_mask(&bands, stack.nodata(), &mask);
        let valid_idx: Vec<usize> = valid
            .iter()
            .enumerate()
            .filter_map(|(i, &ok)| ok.then_some(i))
            .collect();

        let mut predictions = vec![0u16; tile.num_pixels()];

        if valid_idx.is_empty() {
            debug!("Block {} has no valid pixels, writing nodata", idx);
        } else {
            let mut features =
                FeatureBlock::with_capacity(column_names.clone(), valid_idx.len());
            let mut row = Vec::with_capacity(column_names.len());
            for &i in &valid_idx {
                row.clear();
                for band in &bands {
                    row.push(f64::from(band[i]));
                }
                row.push(f64::from(mask[i]));
                features.push_row(&row);
            }

            let probabilities = model.predict(&features, opts)?;
            if probabilities.len() != valid_idx.len() {
                return Err(ForestRiskError::PredictionLength {
                    expected: valid_idx.len(),
                    actual: probabilities.len(),
                });
            }

            for (&i, &value) in valid_idx.iter().zip(rescale(&probabilities).iter()) {
                predictions[i] = value;
            }
        }

        let block = Array2::from_shape_vec((tile.height, tile.width), predictions)?;
        output.write_block(&tile, &block)?;
    }

    output.finalize()
}

/// Per-pixel validity: a pixel enters prediction only if no variable band is
/// at its declared nodata value and the forest mask codes it as forest.
fn compute_valid_mask(bands: &[Vec<f32>], nodata: &[f64], mask: &[f32]) -> Vec<bool> {
    let mut valid: Vec<bool> = mask.iter().map(|&m| m == FOREST).collect();
    for (band, &nd) in bands.iter().zip(nodata) {
        let nd = nd as f32;
        for (ok, &value) in valid.iter_mut().zip(band) {
            if value == nd {
                *ok = false;
            }
        }
    }
    valid
}
