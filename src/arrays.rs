//! Dense 2D field storage.
//!
//! Every staggered field component and the permittivity map are stored as a
//! [`Field2D`]: a contiguous `f64` buffer indexed `(i, j)` with `j` running
//! fastest, so the inner loops of the update sweep memory linearly.

/// Shape of a 2D array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Number of entries along x
    pub nx: usize,
    /// Number of entries along y
    pub ny: usize,
}

impl Dimensions {
    /// Create new dimensions.
    pub const fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }

    /// Total number of entries.
    #[inline]
    pub const fn total(&self) -> usize {
        self.nx * self.ny
    }

    /// Flat index of `(i, j)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny, "({i}, {j}) outside {self:?}");
        i * self.ny + j
    }
}

/// Dense 2D array of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field2D {
    dims: Dimensions,
    data: Vec<f64>,
}

impl Field2D {
    /// Zero-initialized array.
    pub fn new(dims: Dimensions) -> Self {
        Self::filled(dims, 0.0)
    }

    /// Array with every entry set to `value`.
    pub fn filled(dims: Dimensions, value: f64) -> Self {
        Self {
            dims,
            data: vec![value; dims.total()],
        }
    }

    /// Shape of the array.
    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Read entry `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.dims.index(i, j)]
    }

    /// Overwrite entry `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.dims.index(i, j);
        self.data[idx] = value;
    }

    /// Add `value` to entry `(i, j)`.
    #[inline]
    pub fn add(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.dims.index(i, j);
        self.data[idx] += value;
    }

    /// Contiguous slice `(i, 0..ny)`.
    #[inline]
    pub fn column(&self, i: usize) -> &[f64] {
        let start = i * self.dims.ny;
        &self.data[start..start + self.dims.ny]
    }

    /// Mutable contiguous slice `(i, 0..ny)`.
    #[inline]
    pub fn column_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.dims.ny;
        &mut self.data[start..start + self.dims.ny]
    }

    /// Set every entry to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Zero every entry.
    pub fn clear(&mut self) {
        self.fill(0.0);
    }

    /// Fill the rectangular block `i0..i1 × j0..j1` (clipped to the array).
    pub fn fill_block(&mut self, i0: usize, i1: usize, j0: usize, j1: usize, value: f64) {
        let i1 = i1.min(self.dims.nx);
        let j1 = j1.min(self.dims.ny);
        for i in i0..i1 {
            if j0 < j1 {
                self.column_mut(i)[j0..j1].fill(value);
            }
        }
    }

    /// Raw data.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Largest absolute value, NaN-propagating.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |acc, v| {
            if v.is_nan() || acc.is_nan() {
                f64::NAN
            } else {
                acc.max(v.abs())
            }
        })
    }

    /// Sum of squared entries.
    pub fn sum_squares(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum()
    }

    /// Whether every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}
