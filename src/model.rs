use crate::error::Result;
use std::collections::BTreeMap;

/// Largest value the uint16 prediction raster can encode; 0 is reserved for
/// "not predicted".
pub const MAX_ENCODABLE: u16 = u16::MAX;

/// A fitted deforestation model. Implementations receive one row per valid
/// pixel and must return one probability per row, in row order.
pub trait ProbabilityModel {
    fn predict(&self, features: &FeatureBlock, opts: &PredictOptions) -> Result<Vec<f64>>;
}

/// Pass-through keyword configuration handed to [`ProbabilityModel::predict`].
/// Opaque to the prediction engine.
#[derive(Debug, Clone, Default)]
pub struct PredictOptions {
    values: BTreeMap<String, f64>,
}

impl PredictOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<S: Into<String>>(mut self, key: S, value: f64) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named-column, row-major table of feature values: one row per valid pixel,
/// one column per stack band plus the forest-mask column appended last.
/// Lives only for the duration of one tile's prediction.
#[derive(Debug, Clone)]
pub struct FeatureBlock {
    names: Vec<String>,
    data: Vec<f64>,
    ncols: usize,
}

impl FeatureBlock {
    pub fn with_capacity(names: Vec<String>, nrows: usize) -> Self {
        let ncols = names.len();
        Self {
            names,
            data: Vec::with_capacity(nrows * ncols),
            ncols,
        }
    }

    /// Append one pixel's values. `row` must have one value per column.
    pub fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.ncols);
        self.data.extend_from_slice(row);
    }

    pub fn nrows(&self) -> usize {
        if self.ncols == 0 {
            0
        } else {
            self.data.len() / self.ncols
        }
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column names in band order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.ncols + col]
    }

    /// Rows as contiguous slices, in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.ncols)
    }

    /// All values of the named column, or `None` for an unknown name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let col = self.names.iter().position(|n| n == name)?;
        Some(self.rows().map(|r| r[col]).collect())
    }
}

/// Map probabilities onto the encodable range `[1, MAX_ENCODABLE]`.
///
/// Monotone and deterministic; inputs outside [0, 1] clamp to the range ends.
/// 0 never appears in the output, so it stays reserved for unpredicted pixels.
pub fn rescale(probabilities: &[f64]) -> Vec<u16> {
    probabilities
        .iter()
        .map(|&p| {
            let scaled = 1.0 + p * f64::from(MAX_ENCODABLE - 1);
            scaled.round().clamp(1.0, f64::from(MAX_ENCODABLE)) as u16
        })
        .collect()
}
