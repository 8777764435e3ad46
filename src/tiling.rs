use log::debug;

/// One rectangular block of the raster, addressed in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x_off: usize,
    pub y_off: usize,
    pub width: usize,
    pub height: usize,
}

impl Tile {
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }
}

/// Deterministic partition of a raster into row bands, optionally split
/// along columns. Tiles cover the raster exactly and disjointly, enumerated
/// row-major.
pub struct TileGrid {
    ncol: usize,
    nrow: usize,
    block_cols: usize,
    block_rows: usize,
    pub tiles_x: usize,
    pub tiles_y: usize,
}

impl TileGrid {
    /// Row-banded tiling: bands of `block_rows` rows spanning the full width,
    /// the last band truncated to the remaining rows. `block_rows == 0` means
    /// the whole raster is a single tile.
    pub fn new(ncol: usize, nrow: usize, block_rows: usize) -> Self {
        Self::with_block_cols(ncol, nrow, block_rows, 0)
    }

    /// Like [`TileGrid::new`] but each band is additionally split into blocks
    /// of `block_cols` columns (`0` keeps the full width).
    pub fn with_block_cols(
        ncol: usize,
        nrow: usize,
        block_rows: usize,
        block_cols: usize,
    ) -> Self {
        let block_rows = if block_rows == 0 { nrow } else { block_rows };
        let block_cols = if block_cols == 0 { ncol } else { block_cols };

        // Ceiling division; zero-sized rasters yield zero tiles.
        let tiles_x = if ncol == 0 { 0 } else { (ncol + block_cols - 1) / block_cols };
        let tiles_y = if nrow == 0 { 0 } else { (nrow + block_rows - 1) / block_rows };

        debug!(
            "TileGrid: {}x{} raster, block={}x{} -> {}x{} tiles ({} total)",
            ncol,
            nrow,
            block_cols,
            block_rows,
            tiles_x,
            tiles_y,
            tiles_x * tiles_y
        );

        Self {
            ncol,
            nrow,
            block_cols,
            block_rows,
            tiles_x,
            tiles_y,
        }
    }

    pub fn len(&self) -> usize {
        self.tiles_x * self.tiles_y
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tile for a linear index: `x_index = idx % tiles_x`, `y_index = idx / tiles_x`.
    pub fn tile(&self, idx: usize) -> Tile {
        let tx = idx % self.tiles_x;
        let ty = idx / self.tiles_x;

        let x_off = tx * self.block_cols;
        let y_off = ty * self.block_rows;
        let x_end = ((tx + 1) * self.block_cols).min(self.ncol);
        let y_end = ((ty + 1) * self.block_rows).min(self.nrow);

        Tile {
            x_off,
            y_off,
            width: x_end - x_off,
            height: y_end - y_off,
        }
    }

    pub fn iter(&self) -> TileIterator<'_> {
        TileIterator {
            grid: self,
            current: 0,
        }
    }
}

pub struct TileIterator<'a> {
    grid: &'a TileGrid,
    current: usize,
}

impl<'a> Iterator for TileIterator<'a> {
    type Item = (usize, Tile);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.grid.len() {
            let idx = self.current;
            self.current += 1;
            Some((idx, self.grid.tile(idx)))
        } else {
            None
        }
    }
}
