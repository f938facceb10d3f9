//! Viscosity score: entropy lost by a reduction, normalized by source
//! entropy and penalized by deformation and a curvature correction.
//!
//! ```text
//! viscosity = (E0 - E1) / (E0 * (1 + D) * (1 + 0.1 * (2 - C0)))
//! ```
//!
//! `C0` must be the source curvature computed at [`VISCOSITY_TARGET_DIMS`]
//! components: the `2` in the correction term is that target
//! dimensionality. Changing the reduction target away from 2D changes the
//! meaning of the term, and the formula would have to be revisited with it.

use crate::error::{MetricError, Result};
use serde::{Deserialize, Serialize};

/// Target dimensionality the correction term is coupled to.
pub const VISCOSITY_TARGET_DIMS: usize = 2;

/// Weight of the curvature correction.
pub const CURVATURE_WEIGHT: f64 = 0.1;

/// Below this magnitude the source entropy is treated as zero.
pub const ENTROPY_EPSILON: f64 = 1e-12;

/// The three estimator outputs a viscosity score is folded from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViscosityInputs {
    /// Entropy of the source point set
    pub source_entropy: f64,
    /// Entropy of the reduced point set
    pub reduced_entropy: f64,
    /// Curvature of the source at `VISCOSITY_TARGET_DIMS` components
    pub source_curvature: f64,
    /// Deformation between source and reduced point sets
    pub deformation: f64,
}

impl ViscosityInputs {
    pub fn score(&self) -> Result<f64> {
        viscosity(
            self.source_entropy,
            self.reduced_entropy,
            self.source_curvature,
            self.deformation,
        )
    }
}

/// Compose a viscosity score. Unbounded in sign and magnitude.
pub fn viscosity(e0: f64, e1: f64, c0: f64, d: f64) -> Result<f64> {
    for (name, value) in [
        ("source entropy", e0),
        ("reduced entropy", e1),
        ("source curvature", c0),
        ("deformation", d),
    ] {
        if !value.is_finite() {
            return Err(MetricError::InvalidParameter(format!(
                "{} is not finite ({})",
                name, value
            )));
        }
    }
    if e0.abs() < ENTROPY_EPSILON {
        return Err(MetricError::DivisionByZero(e0));
    }

    let correction = 1.0 + CURVATURE_WEIGHT * (VISCOSITY_TARGET_DIMS as f64 - c0);
    let score = (e0 - e1) / (e0 * (1.0 + d) * correction);
    if !score.is_finite() {
        return Err(MetricError::DivisionByZero(e0));
    }
    Ok(score)
}
