//! Principal component analysis: the deterministic, invertible reducer.

use super::{InvertibleReducer, ReductionParams, ReductionResult, Reducer};
use crate::error::{MetricError, Result};
use crate::linalg::{column_means, covariance, sorted_eigen};
use crate::points::PointSet;
use ndarray::{Array1, Array2};
use tracing::debug;

/// Explained-variance ratio of every principal direction, descending.
pub fn explained_variance_ratio(points: &PointSet) -> Result<Vec<f64>> {
    let spectrum = variance_spectrum(points)?;
    let total: f64 = spectrum.iter().sum();
    Ok(spectrum.iter().map(|v| v / total).collect())
}

/// Eigenvalues of the sample covariance, descending and non-negative.
fn variance_spectrum(points: &PointSet) -> Result<Vec<f64>> {
    check_points(points)?;
    let (values, _) = sorted_eigen(covariance(points.view(), 1));
    check_variance(&values)?;
    Ok(values)
}

fn check_points(points: &PointSet) -> Result<()> {
    if points.n_points() < 2 {
        return Err(MetricError::DegenerateInput(format!(
            "principal components need at least 2 points, got {}",
            points.n_points()
        )));
    }
    if points.n_dims() == 0 {
        return Err(MetricError::DegenerateInput(
            "principal components need at least 1 feature".to_string(),
        ));
    }
    Ok(())
}

fn check_variance(values: &[f64]) -> Result<()> {
    let total: f64 = values.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return Err(MetricError::DegenerateInput(
            "zero variance in all features".to_string(),
        ));
    }
    Ok(())
}

/// PCA reducer. The target dimensionality is the retained component count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pca;

/// A fitted PCA model.
#[derive(Debug, Clone)]
pub struct FittedPca {
    /// Per-feature mean of the training data
    pub mean: Array1<f64>,
    /// Principal axes, one per row (k × D)
    pub components: Array2<f64>,
    /// Variance along each retained axis
    pub explained_variance: Vec<f64>,
    /// Share of total variance along each retained axis
    pub explained_variance_ratio: Vec<f64>,
}

impl FittedPca {
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    /// Project points onto the retained axes.
    pub fn transform(&self, points: &PointSet) -> Result<PointSet> {
        if points.n_dims() != self.mean.len() {
            return Err(MetricError::InvalidParameter(format!(
                "model was fitted on {} features, got {}",
                self.mean.len(),
                points.n_dims()
            )));
        }
        let centered = &points.view() - &self.mean;
        PointSet::new(centered.dot(&self.components.t()))
    }

    /// Map projected points back into the original feature space.
    pub fn inverse_transform(&self, projected: &PointSet) -> Result<PointSet> {
        if projected.n_dims() != self.n_components() {
            return Err(MetricError::InvalidParameter(format!(
                "model has {} components, got {}-dimensional points",
                self.n_components(),
                projected.n_dims()
            )));
        }
        let restored = projected.view().dot(&self.components) + &self.mean;
        PointSet::new(restored)
    }
}

impl Pca {
    /// Fit a model retaining `n_components` axes.
    pub fn fit(&self, points: &PointSet, n_components: usize) -> Result<FittedPca> {
        if n_components == 0 {
            return Err(MetricError::InvalidParameter(
                "component count must be positive".to_string(),
            ));
        }
        if n_components > points.n_dims() {
            return Err(MetricError::InvalidParameter(format!(
                "requested {} components but data has {} features",
                n_components,
                points.n_dims()
            )));
        }
        if n_components > points.n_points() {
            return Err(MetricError::InvalidParameter(format!(
                "requested {} components but data has {} samples",
                n_components,
                points.n_points()
            )));
        }
        check_points(points)?;

        let d = points.n_dims();
        let mean = column_means(points.view());
        let (values, vectors) = sorted_eigen(covariance(points.view(), 1));
        check_variance(&values)?;

        let total: f64 = values.iter().sum();
        let components = Array2::from_shape_fn((n_components, d), |(c, f)| vectors[(f, c)]);
        let explained_variance: Vec<f64> = values[..n_components].to_vec();
        let explained_variance_ratio = explained_variance.iter().map(|v| v / total).collect();

        debug!(
            "PCA fit: {} points, {} features -> {} components",
            points.n_points(),
            d,
            n_components
        );

        Ok(FittedPca {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }
}

impl Reducer for Pca {
    fn name(&self) -> &'static str {
        "pca"
    }

    fn reduce(&self, points: &PointSet, target_dims: usize) -> Result<ReductionResult> {
        self.fit_reduce(points, target_dims).map(|(_, reduced)| reduced)
    }
}

impl InvertibleReducer for Pca {
    type Model = FittedPca;

    fn fit_reduce(
        &self,
        points: &PointSet,
        target_dims: usize,
    ) -> Result<(FittedPca, ReductionResult)> {
        let model = self.fit(points, target_dims)?;
        let projected = model.transform(points)?;
        Ok((
            model,
            ReductionResult {
                points: projected,
                params: ReductionParams::Components(target_dims),
            },
        ))
    }

    /// `reduced` must be a projection produced by `model`.
    fn reconstruct(&self, model: &FittedPca, reduced: &ReductionResult) -> Result<PointSet> {
        let expected = ReductionParams::Components(model.n_components());
        if reduced.params != expected {
            return Err(MetricError::InvalidParameter(format!(
                "cannot reconstruct a {:?} reduction through a {}-component PCA model",
                reduced.params,
                model.n_components()
            )));
        }
        model.inverse_transform(&reduced.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::deformation;

    fn tilted_plane() -> PointSet {
        // Points on the plane z = x + y, embedded in 3D
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| {
                let x = (i % 6) as f64;
                let y = (i / 6) as f64 * 0.7;
                vec![x, y, x + y]
            })
            .collect();
        PointSet::from_rows(&rows).unwrap()
    }

    #[test]
    fn full_rank_reconstruction_is_exact() {
        let points = tilted_plane();
        let (model, reduced) = Pca.fit_reduce(&points, 3).unwrap();
        let restored = Pca.reconstruct(&model, &reduced).unwrap();
        assert!(deformation(&points, &restored).unwrap() < 1e-9);
    }

    #[test]
    fn planar_data_reconstructs_from_two_components() {
        let points = tilted_plane();
        let (model, reduced) = Pca.fit_reduce(&points, 2).unwrap();
        assert_eq!(reduced.points.n_dims(), 2);
        assert_eq!(reduced.params, ReductionParams::Components(2));
        let restored = Pca.reconstruct(&model, &reduced).unwrap();
        assert_eq!(restored.n_dims(), 3);
        for (a, b) in points.as_slice().iter().zip(restored.as_slice()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn lossy_reconstruction_has_positive_recovery() {
        let points = tilted_plane();
        let (model, reduced) = Pca.fit_reduce(&points, 1).unwrap();
        let restored = Pca.reconstruct(&model, &reduced).unwrap();
        assert!(deformation(&points, &restored).unwrap() > 0.0);
    }

    #[test]
    fn deterministic() {
        let points = tilted_plane();
        let a = Pca.reduce(&points, 2).unwrap();
        let b = Pca.reduce(&points, 2).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn ratios_sum_to_one() {
        let ratios = explained_variance_ratio(&tilted_plane()).unwrap();
        assert_eq!(ratios.len(), 3);
        assert!((ratios.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(ratios[2] < 1e-12, "plane has no variance off-plane");
    }

    #[test]
    fn too_many_components_rejected_up_front() {
        let result = Pca.reduce(&tilted_plane(), 4);
        assert!(matches!(result, Err(MetricError::InvalidParameter(_))));
    }

    #[test]
    fn zero_components_rejected() {
        let result = Pca.reduce(&tilted_plane(), 0);
        assert!(matches!(result, Err(MetricError::InvalidParameter(_))));
    }

    #[test]
    fn wrong_width_reconstruction_rejected() {
        let points = tilted_plane();
        let (model, _) = Pca.fit_reduce(&points, 2).unwrap();
        let bogus = ReductionResult {
            points: PointSet::from_rows(&[vec![1.0, 2.0, 3.0]]).unwrap(),
            params: ReductionParams::Components(3),
        };
        assert!(Pca.reconstruct(&model, &bogus).is_err());
    }

    #[test]
    fn foreign_reduction_rejected() {
        use crate::reduce::{Tsne, TsneConfig};

        let points = tilted_plane();
        let (model, _) = Pca.fit_reduce(&points, 2).unwrap();
        let embedded = Tsne::new(5.0, 0)
            .with_config(TsneConfig {
                n_iter: 260,
                ..Default::default()
            })
            .reduce(&points, 2)
            .unwrap();
        assert_eq!(embedded.points.n_dims(), 2);
        let result = Pca.reconstruct(&model, &embedded);
        assert!(matches!(result, Err(MetricError::InvalidParameter(_))));
    }

    #[test]
    fn reduction_from_another_component_count_rejected() {
        let points = tilted_plane();
        let (model, _) = Pca.fit_reduce(&points, 2).unwrap();
        let (_, one) = Pca.fit_reduce(&points, 1).unwrap();
        let relabelled = ReductionResult {
            points: one.points,
            params: ReductionParams::Components(1),
        };
        assert!(matches!(
            Pca.reconstruct(&model, &relabelled),
            Err(MetricError::InvalidParameter(_))
        ));
    }
}
