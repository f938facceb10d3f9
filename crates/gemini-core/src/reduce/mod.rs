//! Reduction adapters
//!
//! A uniform [`Reducer`] contract over heterogeneous dimensionality
//! reduction transforms. Invertibility is a separate capability,
//! [`InvertibleReducer`], implemented only by transforms that have an
//! inverse.
//!
//! | Reducer | Stochastic | Invertible | Parameter |
//! |---------|------------|------------|-----------|
//! | [`Tsne`] | yes (seeded) | no | perplexity |
//! | [`Pca`]  | no | yes | component count |
//!
//! Both expect standardized input (zero mean, unit variance per feature).

pub mod pca;
pub mod tsne;

pub use pca::{explained_variance_ratio, FittedPca, Pca};
pub use tsne::{LearningRate, Tsne, TsneConfig, TsneInit};

use crate::error::Result;
use crate::points::PointSet;
use serde::{Deserialize, Serialize};

/// Parameter tag attached to a reduction output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionParams {
    /// Neighborhood size of a stochastic neighbor embedding
    Perplexity(f64),
    /// Retained component count of a linear projection
    Components(usize),
}

/// A lower-dimensional point set with the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionResult {
    pub points: PointSet,
    pub params: ReductionParams,
}

/// Contract for dimensionality reduction transforms.
pub trait Reducer {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Reduce `points` to `target_dims` dimensions.
    ///
    /// Parameters are validated before the transform runs.
    fn reduce(&self, points: &PointSet, target_dims: usize) -> Result<ReductionResult>;
}

/// Reducers that can map a reduction back into the source space.
pub trait InvertibleReducer: Reducer {
    /// Fitted state needed to invert a reduction.
    type Model;

    /// Fit on `points` and reduce them, keeping the fitted model.
    fn fit_reduce(&self, points: &PointSet, target_dims: usize)
        -> Result<(Self::Model, ReductionResult)>;

    /// Map a reduction produced by `model` back to the original dimensionality.
    fn reconstruct(&self, model: &Self::Model, reduced: &ReductionResult) -> Result<PointSet>;
}
