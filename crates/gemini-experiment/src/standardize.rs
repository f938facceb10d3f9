//! Per-feature standardization, fit and applied on the same data

use gemini_core::{PointSet, Result};
use ndarray::Axis;

/// Shift every feature to zero mean and scale it to unit population
/// variance. Constant features are centered and left unscaled.
pub fn standardize(points: &PointSet) -> Result<PointSet> {
    let view = points.view();
    if points.n_points() == 0 {
        return Ok(points.clone());
    }
    let means = view.mean_axis(Axis(0)).unwrap_or_default();
    let mut scales = view.std_axis(Axis(0), 0.0);
    scales.mapv_inplace(|s| if s > 0.0 { s } else { 1.0 });
    PointSet::new((&view - &means) / &scales)
}
