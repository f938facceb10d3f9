//! Statistical estimators over point sets
//!
//! - **entropy**: KDE-based differential entropy (stochastic, seeded)
//! - **curvature**: leading explained-variance share (deterministic)
//! - **deformation**: mean absolute pairwise-distance change (deterministic)

mod curvature;
mod deformation;
mod entropy;

pub use curvature::curvature;
pub use deformation::{deformation, pairwise_distances};
pub use entropy::{entropy, Bandwidth, EntropyEstimator};
