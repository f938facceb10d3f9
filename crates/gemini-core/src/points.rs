//! Point sets: N samples in D-dimensional real space.

use crate::error::{MetricError, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// An immutable N×D matrix of finite reals, rows = samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    data: Array2<f64>,
}

impl PointSet {
    /// Wrap an existing matrix, rejecting non-finite entries.
    ///
    /// The matrix is copied into standard (row-major) layout if needed.
    pub fn new(data: Array2<f64>) -> Result<Self> {
        if let Some(((row, col), value)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(MetricError::InvalidParameter(format!(
                "non-finite value {} at row {}, column {}",
                value, row, col
            )));
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data })
    }

    /// Build from a flat row-major buffer.
    pub fn from_shape_vec(n_points: usize, n_dims: usize, values: Vec<f64>) -> Result<Self> {
        if values.len() != n_points * n_dims {
            return Err(MetricError::InvalidParameter(format!(
                "data length {} != n_points {} * n_dims {}",
                values.len(),
                n_points,
                n_dims
            )));
        }
        let data = Array2::from_shape_vec((n_points, n_dims), values)
            .map_err(|e| MetricError::InvalidParameter(e.to_string()))?;
        Self::new(data)
    }

    /// Build from rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_dims = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_dims) {
            return Err(MetricError::InvalidParameter(format!(
                "ragged rows: row {} has {} values, expected {}",
                i,
                row.len(),
                n_dims
            )));
        }
        let flat = rows.iter().flatten().copied().collect();
        Self::from_shape_vec(rows.len(), n_dims, flat)
    }

    pub fn n_points(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_dims(&self) -> usize {
        self.data.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.data.axis_iter(Axis(0))
    }

    /// Contiguous row-major buffer of all values.
    pub fn as_slice(&self) -> &[f64] {
        // standard layout is enforced in `new`
        self.data.as_slice().unwrap_or(&[])
    }

    /// Values of row `i` as a contiguous slice.
    pub fn row_slice(&self, i: usize) -> &[f64] {
        let d = self.n_dims();
        &self.as_slice()[i * d..(i + 1) * d]
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }

    /// Stack two point sets with the same dimensionality on top of each other.
    pub fn stack(&self, other: &PointSet) -> Result<Self> {
        if self.n_dims() != other.n_dims() {
            return Err(MetricError::InvalidParameter(format!(
                "cannot stack {}-dimensional points onto {}-dimensional points",
                other.n_dims(),
                self.n_dims()
            )));
        }
        let data = ndarray::concatenate(Axis(0), &[self.data.view(), other.data.view()])
            .map_err(|e| MetricError::InvalidParameter(e.to_string()))?;
        Self::new(data)
    }
}
