//! Uniform-cell spatial grid for radius queries.
//!
//! The grid covers a fixed extent split into square cells of `cell_size`.
//! It is rebuilt from scratch (clear + insert) on every connectivity pass.
//! Coordinates outside the extent are clamped into the border cells, which
//! keeps queries correct: clamping never increases the cell distance between
//! two points.
//!
//! The cell count per axis is capped; a huge extent (one stray point far
//! off-canvas) widens the cells instead of allocating more of them.
//!
//! `query` returns a candidate superset. A query of radius `r` visits the
//! `(2·⌈r/cell_size⌉ + 1)²` block around the query cell, so corner cells may
//! hold points farther than `r`; callers do the exact distance check.

/// Upper bound on cells along either axis.
pub const MAX_CELLS_PER_AXIS: usize = 128;

/// Spatial grid storing items of type `T` (typically node ids).
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    min_x: f32,
    min_y: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<T>>,
    len: usize,
}

impl<T: Copy> SpatialGrid<T> {
    /// Create a grid covering `(min_x, min_y)..(max_x, max_y)`.
    ///
    /// A non-positive or non-finite `cell_size` falls back to a single cell
    /// spanning the whole extent. Cells are widened as needed so that neither
    /// axis exceeds [`MAX_CELLS_PER_AXIS`].
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32, cell_size: f32) -> Self {
        let width = (max_x - min_x).max(0.0);
        let height = (max_y - min_y).max(0.0);
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            width.max(height).max(1.0)
        };
        let cap = MAX_CELLS_PER_AXIS as f32;
        let cell_size = cell_size.max(width / cap).max(height / cap);
        let cell_size = if cell_size.is_finite() { cell_size } else { f32::MAX };

        let cols = Self::axis_cells(width, cell_size);
        let rows = Self::axis_cells(height, cell_size);

        Self {
            min_x,
            min_y,
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            len: 0,
        }
    }

    /// Empty every bucket, keeping allocations.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.len = 0;
    }

    /// Place an item into the cell containing (x, y).
    pub fn insert(&mut self, item: T, x: f32, y: f32) {
        let (col, row) = self.cell_of(x, y);
        self.cells[row * self.cols + col].push(item);
        self.len += 1;
    }

    /// All items in the block of cells around (x, y) that can hold points
    /// within `radius`. The result is a superset of the true neighbours.
    pub fn query(&self, x: f32, y: f32, radius: f32) -> Vec<T> {
        let mut found = Vec::new();
        if self.len == 0 || !(radius >= 0.0) {
            return found;
        }

        let reach = (radius / self.cell_size).ceil();
        let reach = if reach.is_finite() {
            reach as usize
        } else {
            self.cols.max(self.rows)
        };
        let (col, row) = self.cell_of(x, y);

        let col_lo = col.saturating_sub(reach);
        let col_hi = (col + reach).min(self.cols - 1);
        let row_lo = row.saturating_sub(reach);
        let row_hi = (row + reach).min(self.rows - 1);

        for r in row_lo..=row_hi {
            for c in col_lo..=col_hi {
                found.extend_from_slice(&self.cells[r * self.cols + c]);
            }
        }
        found
    }

    /// Number of items inserted since the last clear.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions as (columns, rows).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    fn axis_cells(extent: f32, cell_size: f32) -> usize {
        // `min` drops NaN, and the float-to-int cast saturates.
        let last = (extent / cell_size).floor().min((MAX_CELLS_PER_AXIS - 1) as f32);
        last as usize + 1
    }

    fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        (
            Self::clamp_axis((x - self.min_x) / self.cell_size, self.cols),
            Self::clamp_axis((y - self.min_y) / self.cell_size, self.rows),
        )
    }

    fn clamp_axis(t: f32, count: usize) -> usize {
        // NaN lands in cell 0.
        if !(t > 0.0) {
            return 0;
        }
        let cell = t.floor();
        if cell >= (count - 1) as f32 {
            count - 1
        } else {
            cell as usize
        }
    }
}
