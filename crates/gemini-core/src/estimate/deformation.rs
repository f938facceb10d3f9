//! Deformation: mean absolute change in pairwise distances.

use crate::error::{MetricError, Result};
use crate::linalg::squared_distance;
use crate::points::PointSet;

/// Condensed pairwise Euclidean distances, pairs `(i, j)` with `i < j`
/// in row-major order.
pub fn pairwise_distances(points: &PointSet) -> Vec<f64> {
    let n = points.n_points();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        let a = points.row_slice(i);
        for j in (i + 1)..n {
            out.push(squared_distance(a, points.row_slice(j)).sqrt());
        }
    }
    out
}

/// Mean absolute difference between the pairwise distances of `a` and `b`.
///
/// Rows correspond one-to-one; the two sets may live in different
/// dimensions. Quadratic in the point count.
pub fn deformation(a: &PointSet, b: &PointSet) -> Result<f64> {
    if a.n_points() != b.n_points() {
        return Err(MetricError::ShapeMismatch {
            left: a.n_points(),
            right: b.n_points(),
        });
    }
    if a.n_points() < 2 {
        return Err(MetricError::DegenerateInput(format!(
            "deformation needs at least 2 points, got {}",
            a.n_points()
        )));
    }

    let n = a.n_points();
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        let (ai, bi) = (a.row_slice(i), b.row_slice(i));
        for j in (i + 1)..n {
            let da = squared_distance(ai, a.row_slice(j)).sqrt();
            let db = squared_distance(bi, b.row_slice(j)).sqrt();
            total += (da - db).abs();
            pairs += 1;
        }
    }
    Ok(total / pairs as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square() -> PointSet {
        PointSet::from_rows(&[
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn condensed_order() {
        let points = PointSet::from_rows(&[vec![0.0], vec![1.0], vec![3.0]]).unwrap();
        assert_eq!(pairwise_distances(&points), vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn identity_has_zero_deformation() {
        let a = square();
        assert_eq!(deformation(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = square();
        let b = PointSet::from_rows(&[vec![0.0], vec![2.0], vec![5.0], vec![-1.0]]).unwrap();
        assert_eq!(
            deformation(&a, &b).unwrap().to_bits(),
            deformation(&b, &a).unwrap().to_bits()
        );
    }

    #[test]
    fn uniform_scaling() {
        let a = square();
        let doubled = PointSet::new(a.view().to_owned() * 2.0).unwrap();
        // Every distance doubles, so the mean change equals the mean distance
        let mean: f64 = pairwise_distances(&a).iter().sum::<f64>() / 6.0;
        assert!((deformation(&a, &doubled).unwrap() - mean).abs() < 1e-12);
    }

    #[test]
    fn rigid_motion_preserves_geometry() {
        let a = square();
        let moved: Vec<Vec<f64>> = a.rows().map(|r| vec![-r[1] + 3.0, r[0] - 2.0]).collect();
        let moved = PointSet::from_rows(&moved).unwrap();
        assert!(deformation(&a, &moved).unwrap() < 1e-12);
    }

    #[test]
    fn mismatched_counts_fail_fast() {
        let a = square();
        let b = PointSet::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        assert_eq!(
            deformation(&a, &b),
            Err(MetricError::ShapeMismatch { left: 4, right: 2 })
        );
    }

    #[test]
    fn single_point_is_degenerate() {
        let a = PointSet::from_rows(&[vec![0.0]]).unwrap();
        assert!(matches!(
            deformation(&a, &a),
            Err(MetricError::DegenerateInput(_))
        ));
    }
}
