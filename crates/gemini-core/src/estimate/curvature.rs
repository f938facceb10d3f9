//! Curvature: share of total variance captured by the leading principal directions.

use crate::error::{MetricError, Result};
use crate::points::PointSet;
use crate::reduce::pca::explained_variance_ratio;

/// Sum of the top `min(D, k)` explained-variance ratios, in `[0, 1]`.
///
/// Values near 1 mean the structure lives in few directions (flat, close to
/// linear); values near `k / D` mean variance is spread evenly.
pub fn curvature(points: &PointSet, k: usize) -> Result<f64> {
    if k == 0 {
        return Err(MetricError::InvalidParameter(
            "curvature needs at least 1 component".to_string(),
        ));
    }
    let ratios = explained_variance_ratio(points)?;
    let captured: f64 = ratios.iter().take(k.min(points.n_dims())).sum();
    Ok(captured.clamp(0.0, 1.0))
}
