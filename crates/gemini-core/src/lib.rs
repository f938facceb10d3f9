//! GEMINI Core
//!
//! Estimators that quantify how much a dimensionality reduction distorts
//! the statistical structure of a point set, and the reducers they are
//! measured against.
//!
//! # Modules
//!
//! - **points**: immutable N×D point sets
//! - **estimate**: entropy (KDE), curvature (PCA variance share), deformation
//! - **viscosity**: composite score folded from the three estimates
//! - **reduce**: t-SNE (stochastic) and PCA (invertible) behind one contract
//!
//! # Example
//!
//! ```rust
//! use gemini_core::estimate::{curvature, deformation, entropy};
//! use gemini_core::reduce::{Pca, Reducer};
//! use gemini_core::{viscosity, PointSet};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let rows: Vec<Vec<f64>> = (0..40)
//!     .map(|i| {
//!         let t = i as f64 * 0.3;
//!         vec![t.cos(), t.sin(), 0.1 * t, (2.0 * t).sin()]
//!     })
//!     .collect();
//! let source = PointSet::from_rows(&rows).unwrap();
//! let reduced = Pca.reduce(&source, 2).unwrap().points;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let e0 = entropy(&source, &mut rng).unwrap();
//! let e1 = entropy(&reduced, &mut rng).unwrap();
//! let c0 = curvature(&source, 2).unwrap();
//! let d = deformation(&source, &reduced).unwrap();
//! let score = viscosity(e0, e1, c0, d).unwrap();
//! assert!(score.is_finite());
//! ```

pub mod error;
pub mod estimate;
mod linalg;
pub mod points;
pub mod reduce;
pub mod viscosity;

pub use error::{MetricError, Result};
pub use points::PointSet;
pub use reduce::{InvertibleReducer, ReductionParams, ReductionResult, Reducer};
pub use viscosity::{viscosity, ViscosityInputs, VISCOSITY_TARGET_DIMS};
