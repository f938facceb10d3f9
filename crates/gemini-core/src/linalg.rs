//! Dense linear algebra shared by the estimators and PCA.
//!
//! Point storage is `ndarray`; decompositions go through `nalgebra`.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, ArrayView2, Axis};

/// Per-column mean. Callers guarantee at least one row.
pub(crate) fn column_means(data: ArrayView2<'_, f64>) -> Array1<f64> {
    data.mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(data.ncols()))
}

/// Sample covariance with the given delta degrees of freedom.
pub(crate) fn covariance(data: ArrayView2<'_, f64>, ddof: usize) -> DMatrix<f64> {
    let (n, d) = data.dim();
    let means = column_means(data);
    let centered = &data - &means;
    let denom = (n.saturating_sub(ddof)).max(1) as f64;
    let gram = centered.t().dot(&centered);
    DMatrix::from_fn(d, d, |i, j| gram[[i, j]] / denom)
}

/// Eigen-decomposition of a symmetric matrix, eigenvalues descending.
///
/// Negative eigenvalues from round-off are clamped to zero. Each
/// eigenvector is sign-normalized so its largest-magnitude entry is positive.
pub(crate) fn sorted_eigen(matrix: DMatrix<f64>) -> (Vec<f64>, DMatrix<f64>) {
    let d = matrix.nrows();
    let eigen = SymmetricEigen::new(matrix);

    let mut order: Vec<usize> = (0..d).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let values = order
        .iter()
        .map(|&i| eigen.eigenvalues[i].max(0.0))
        .collect();

    let mut vectors = DMatrix::zeros(d, d);
    for (dst, &src) in order.iter().enumerate() {
        let column = eigen.eigenvectors.column(src);
        let pivot = column
            .iter()
            .copied()
            .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        for row in 0..d {
            vectors[(row, dst)] = column[row] * sign;
        }
    }

    (values, vectors)
}

/// Squared Euclidean distance between two equally sized slices.
#[inline]
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
