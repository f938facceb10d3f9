//! Exact t-distributed stochastic neighbor embedding.
//!
//! O(N²) per iteration in time and memory; intended for point counts in the
//! low thousands. The output depends on the seed through the initial layout.

use super::{Pca, ReductionParams, ReductionResult, Reducer};
use crate::error::{MetricError, Result};
use crate::linalg::squared_distance;
use crate::points::PointSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

const MACHINE_EPSILON: f64 = f64::EPSILON;
const PERPLEXITY_TOLERANCE: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;
const INIT_SCALE: f64 = 1e-4;
const MIN_GAIN: f64 = 0.01;
/// Convergence is tested on every 50th iteration only.
const N_ITER_CHECK: usize = 50;

/// Initial layout of the embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TsneInit {
    /// Isotropic Gaussian noise with std 1e-4, drawn from the seed
    #[default]
    Random,
    /// Leading principal components, rescaled so the first has std 1e-4
    Pca,
}

/// Gradient descent step size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningRate {
    /// `max(N / early_exaggeration / 4, 50)`
    #[default]
    Auto,
    Fixed(f64),
}

/// Optimizer settings for [`Tsne`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TsneConfig {
    /// Total gradient descent iterations (default: 1000)
    pub n_iter: usize,
    /// Multiplier on P during the early phase (default: 12.0)
    pub early_exaggeration: f64,
    /// Iterations spent in the early phase (default: 250)
    pub exaggeration_iter: usize,
    pub learning_rate: LearningRate,
    pub init: TsneInit,
    /// Stop once the gain-scaled gradient norm falls below this (default: 1e-7)
    pub min_grad_norm: f64,
    /// Stop the late phase after this many iterations without a lower
    /// KL divergence (default: 300). The early phase uses `exaggeration_iter`.
    pub n_iter_without_progress: usize,
}

impl Default for TsneConfig {
    fn default() -> Self {
        Self {
            n_iter: 1000,
            early_exaggeration: 12.0,
            exaggeration_iter: 250,
            learning_rate: LearningRate::Auto,
            init: TsneInit::Random,
            min_grad_norm: 1e-7,
            n_iter_without_progress: 300,
        }
    }
}

/// t-SNE reducer for one perplexity and one seed.
#[derive(Debug, Clone)]
pub struct Tsne {
    pub perplexity: f64,
    pub seed: u64,
    pub config: TsneConfig,
}

impl Tsne {
    pub fn new(perplexity: f64, seed: u64) -> Self {
        Self {
            perplexity,
            seed,
            config: TsneConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TsneConfig) -> Self {
        self.config = config;
        self
    }

    fn validate(&self, points: &PointSet, target_dims: usize) -> Result<()> {
        let n = points.n_points();
        if target_dims == 0 {
            return Err(MetricError::InvalidParameter(
                "t-SNE target dimensionality must be positive".to_string(),
            ));
        }
        if n < 2 {
            return Err(MetricError::DegenerateInput(format!(
                "t-SNE needs at least 2 points, got {}",
                n
            )));
        }
        if !(self.perplexity.is_finite() && self.perplexity > 0.0) {
            return Err(MetricError::InvalidParameter(format!(
                "perplexity must be positive, got {}",
                self.perplexity
            )));
        }
        if self.perplexity >= n as f64 {
            return Err(MetricError::InvalidParameter(format!(
                "perplexity {} must be less than the number of samples {}",
                self.perplexity, n
            )));
        }
        if self.config.n_iter == 0 {
            return Err(MetricError::InvalidParameter(
                "t-SNE needs at least one iteration".to_string(),
            ));
        }
        if self.config.early_exaggeration <= 0.0 {
            return Err(MetricError::InvalidParameter(format!(
                "early exaggeration must be positive, got {}",
                self.config.early_exaggeration
            )));
        }
        if let LearningRate::Fixed(rate) = self.config.learning_rate {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(MetricError::InvalidParameter(format!(
                    "learning rate must be positive, got {}",
                    rate
                )));
            }
        }
        if self.config.init == TsneInit::Pca && target_dims > points.n_dims() {
            return Err(MetricError::InvalidParameter(format!(
                "PCA initialization cannot produce {} dimensions from {} features",
                target_dims,
                points.n_dims()
            )));
        }
        Ok(())
    }

    fn learning_rate(&self, n_points: usize) -> f64 {
        match self.config.learning_rate {
            LearningRate::Auto => {
                (n_points as f64 / self.config.early_exaggeration / 4.0).max(50.0)
            }
            LearningRate::Fixed(rate) => rate,
        }
    }

    fn initial_layout(&self, points: &PointSet, target_dims: usize) -> Result<Vec<f64>> {
        let n = points.n_points();
        match self.config.init {
            TsneInit::Random => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                Ok((0..n * target_dims)
                    .map(|_| INIT_SCALE * rng.sample::<f64, _>(StandardNormal))
                    .collect())
            }
            TsneInit::Pca => {
                let projected = Pca.reduce(points, target_dims)?.points;
                let first: Vec<f64> = (0..n).map(|i| projected.row_slice(i)[0]).collect();
                let mean = first.iter().sum::<f64>() / n as f64;
                let variance = first.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
                let std = variance.sqrt();
                if std.is_nan() || std <= 0.0 {
                    return Err(MetricError::DegenerateInput(
                        "PCA initialization has zero spread".to_string(),
                    ));
                }
                Ok(projected.as_slice().iter().map(|v| v / std * INIT_SCALE).collect())
            }
        }
    }
}

impl Reducer for Tsne {
    fn name(&self) -> &'static str {
        "tsne"
    }

    fn reduce(&self, points: &PointSet, target_dims: usize) -> Result<ReductionResult> {
        self.validate(points, target_dims)?;

        let n = points.n_points();
        let mut p = joint_probabilities(points, self.perplexity);
        let mut y = self.initial_layout(points, target_dims)?;
        let rate = self.learning_rate(n);

        let early = self.config.exaggeration_iter.min(self.config.n_iter);
        let exaggeration = self.config.early_exaggeration;

        p.iter_mut().for_each(|v| *v *= exaggeration);
        let mut optimizer = Optimizer::new(n, target_dims, rate, 0.5, self.config.min_grad_norm);
        let done_early = optimizer.run(&p, &mut y, 0..early, early);

        // The late phase resumes the global iteration count where the early one stopped.
        p.iter_mut().for_each(|v| *v /= exaggeration);
        let mut optimizer = Optimizer::new(n, target_dims, rate, 0.8, self.config.min_grad_norm);
        let done = optimizer.run(
            &p,
            &mut y,
            done_early..self.config.n_iter,
            self.config.n_iter_without_progress,
        );

        debug!(
            "t-SNE perplexity {} seed {}: {} points, {} iterations ({} exaggerated)",
            self.perplexity,
            self.seed,
            n,
            done,
            done_early
        );

        let embedded = PointSet::from_shape_vec(n, target_dims, y)
            .map_err(|_| MetricError::DegenerateInput("t-SNE optimization diverged".to_string()))?;

        Ok(ReductionResult {
            points: embedded,
            params: ReductionParams::Perplexity(self.perplexity),
        })
    }
}

/// Symmetric joint probabilities `(P + Pᵀ) / 2N`, dense row-major N×N.
fn joint_probabilities(points: &PointSet, perplexity: f64) -> Vec<f64> {
    let n = points.n_points();
    let mut distances = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = squared_distance(points.row_slice(i), points.row_slice(j));
            distances[i * n + j] = d;
            distances[j * n + i] = d;
        }
    }

    let conditional = conditional_probabilities(&distances, n, perplexity);

    let mut joint = vec![0.0; n * n];
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            let v = conditional[i * n + j] + conditional[j * n + i];
            joint[i * n + j] = v;
            total += v;
        }
    }
    let total = total.max(MACHINE_EPSILON);
    for (idx, v) in joint.iter_mut().enumerate() {
        *v = if idx / n == idx % n {
            0.0
        } else {
            (*v / total).max(MACHINE_EPSILON)
        };
    }
    joint
}

/// Row-conditional Gaussian affinities, each row calibrated by binary
/// search on the precision so its entropy equals `ln(perplexity)`.
fn conditional_probabilities(distances: &[f64], n: usize, perplexity: f64) -> Vec<f64> {
    let desired_entropy = perplexity.ln();
    let mut out = vec![0.0; n * n];

    for i in 0..n {
        let row = &distances[i * n..(i + 1) * n];
        let probs = &mut out[i * n..(i + 1) * n];

        let mut beta = 1.0;
        let mut beta_min = f64::NEG_INFINITY;
        let mut beta_max = f64::INFINITY;

        for _ in 0..PERPLEXITY_STEPS {
            let mut sum_p = 0.0;
            for (j, p) in probs.iter_mut().enumerate() {
                *p = if j == i { 0.0 } else { (-row[j] * beta).exp() };
                sum_p += *p;
            }
            if sum_p == 0.0 {
                sum_p = 1e-8;
            }

            let mut weighted = 0.0;
            for (p, d) in probs.iter_mut().zip(row) {
                *p /= sum_p;
                weighted += d * *p;
            }

            let entropy = sum_p.ln() + beta * weighted;
            let diff = entropy - desired_entropy;
            if diff.abs() <= PERPLEXITY_TOLERANCE {
                break;
            }

            if diff > 0.0 {
                beta_min = beta;
                beta = if beta_max == f64::INFINITY {
                    beta * 2.0
                } else {
                    (beta + beta_max) / 2.0
                };
            } else {
                beta_max = beta;
                beta = if beta_min == f64::NEG_INFINITY {
                    beta / 2.0
                } else {
                    (beta + beta_min) / 2.0
                };
            }
        }
    }
    out
}

/// Momentum gradient descent with per-parameter adaptive gains.
struct Optimizer {
    n: usize,
    dims: usize,
    learning_rate: f64,
    momentum: f64,
    min_grad_norm: f64,
    update: Vec<f64>,
    gains: Vec<f64>,
    grad: Vec<f64>,
    kernel: Vec<f64>,
}

impl Optimizer {
    fn new(n: usize, dims: usize, learning_rate: f64, momentum: f64, min_grad_norm: f64) -> Self {
        Self {
            n,
            dims,
            learning_rate,
            momentum,
            min_grad_norm,
            update: vec![0.0; n * dims],
            gains: vec![1.0; n * dims],
            grad: vec![0.0; n * dims],
            kernel: vec![0.0; n * n],
        }
    }

    /// Run the global iterations in `range`; returns the index after the last
    /// one taken. Every `N_ITER_CHECK`th iteration stops the phase when the
    /// KL divergence has not improved for more than `patience` iterations or
    /// the gain-scaled gradient norm is at most `min_grad_norm`.
    fn run(
        &mut self,
        p: &[f64],
        y: &mut [f64],
        range: std::ops::Range<usize>,
        patience: usize,
    ) -> usize {
        let end = range.end;
        let mut best_error = f64::MAX;
        let mut best_iter = range.start;

        for it in range {
            let check = (it + 1) % N_ITER_CHECK == 0;
            let error = self.gradient(p, y, check);

            let mut grad_norm = 0.0;
            for k in 0..y.len() {
                let g = self.grad[k];
                if self.update[k] * g < 0.0 {
                    self.gains[k] += 0.2;
                } else {
                    self.gains[k] *= 0.8;
                }
                self.gains[k] = self.gains[k].max(MIN_GAIN);
                let step = self.gains[k] * g;
                grad_norm += step * step;
                self.update[k] = self.momentum * self.update[k] - self.learning_rate * step;
                y[k] += self.update[k];
            }

            if check {
                if error < best_error {
                    best_error = error;
                    best_iter = it;
                } else if it - best_iter > patience {
                    return it + 1;
                }
                if grad_norm.sqrt() <= self.min_grad_norm {
                    return it + 1;
                }
            }
        }
        end
    }

    /// KL(P || Q) gradient into `self.grad`. Returns the divergence itself
    /// when `with_error` is set, 0 otherwise.
    fn gradient(&mut self, p: &[f64], y: &[f64], with_error: bool) -> f64 {
        let (n, dims) = (self.n, self.dims);

        let mut kernel_sum = 0.0;
        for i in 0..n {
            let yi = &y[i * dims..(i + 1) * dims];
            self.kernel[i * n + i] = 0.0;
            for j in (i + 1)..n {
                let w = 1.0 / (1.0 + squared_distance(yi, &y[j * dims..(j + 1) * dims]));
                self.kernel[i * n + j] = w;
                self.kernel[j * n + i] = w;
                kernel_sum += 2.0 * w;
            }
        }
        let kernel_sum = kernel_sum.max(MACHINE_EPSILON);

        self.grad.iter_mut().for_each(|g| *g = 0.0);
        let mut error = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let w = self.kernel[i * n + j];
                let q = (w / kernel_sum).max(MACHINE_EPSILON);
                let pij = p[i * n + j];
                if with_error {
                    error += pij * (pij.max(MACHINE_EPSILON) / q).ln();
                }
                let coeff = 4.0 * (pij - q) * w;
                for k in 0..dims {
                    self.grad[i * dims + k] += coeff * (y[i * dims + k] - y[j * dims + k]);
                }
            }
        }

        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::pairwise_distances;

    fn two_blobs(per_blob: usize, dims: usize) -> PointSet {
        let mut rng = StdRng::seed_from_u64(17);
        let mut values = Vec::with_capacity(2 * per_blob * dims);
        for blob in 0..2 {
            for _ in 0..per_blob {
                for _ in 0..dims {
                    let noise: f64 = rng.sample(StandardNormal);
                    values.push(blob as f64 * 8.0 + 0.3 * noise);
                }
            }
        }
        PointSet::from_shape_vec(2 * per_blob, dims, values).unwrap()
    }

    fn fast_config() -> TsneConfig {
        TsneConfig {
            n_iter: 300,
            exaggeration_iter: 100,
            ..Default::default()
        }
    }

    #[test]
    fn conditional_rows_match_perplexity() {
        let points = two_blobs(15, 3);
        let n = points.n_points();
        let mut distances = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                distances[i * n + j] = squared_distance(points.row_slice(i), points.row_slice(j));
            }
        }
        let perplexity = 5.0;
        let probs = conditional_probabilities(&distances, n, perplexity);
        for i in 0..n {
            let row = &probs[i * n..(i + 1) * n];
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            let entropy: f64 = row.iter().filter(|&&p| p > 0.0).map(|p| -p * p.ln()).sum();
            assert!(
                (entropy.exp() - perplexity).abs() < 1e-2,
                "row {} perplexity {}",
                i,
                entropy.exp()
            );
        }
    }

    #[test]
    fn joint_probabilities_are_symmetric_and_normalized() {
        let points = two_blobs(10, 2);
        let n = points.n_points();
        let p = joint_probabilities(&points, 4.0);
        let total: f64 = p.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        for i in 0..n {
            assert_eq!(p[i * n + i], 0.0);
            for j in 0..n {
                assert!((p[i * n + j] - p[j * n + i]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn separates_well_separated_blobs() {
        let points = two_blobs(20, 5);
        let tsne = Tsne::new(10.0, 0).with_config(fast_config());
        let result = tsne.reduce(&points, 2).unwrap();
        assert_eq!(result.points.n_points(), 40);
        assert_eq!(result.points.n_dims(), 2);
        assert_eq!(result.params, ReductionParams::Perplexity(10.0));

        let centroid = |range: std::ops::Range<usize>| -> [f64; 2] {
            let len = range.len() as f64;
            let mut c = [0.0, 0.0];
            for i in range {
                c[0] += result.points.row_slice(i)[0] / len;
                c[1] += result.points.row_slice(i)[1] / len;
            }
            c
        };
        let (a, b) = (centroid(0..20), centroid(20..40));
        let between = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();

        let within: f64 = (0..20)
            .map(|i| {
                let r = result.points.row_slice(i);
                ((r[0] - a[0]).powi(2) + (r[1] - a[1]).powi(2)).sqrt()
            })
            .sum::<f64>()
            / 20.0;
        assert!(
            between > 2.0 * within,
            "blobs not separated: between {} within {}",
            between,
            within
        );
    }

    #[test]
    fn same_seed_is_bit_identical() {
        let points = two_blobs(12, 3);
        let a = Tsne::new(5.0, 3).with_config(fast_config()).reduce(&points, 2).unwrap();
        let b = Tsne::new(5.0, 3).with_config(fast_config()).reduce(&points, 2).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn different_seed_changes_layout() {
        let points = two_blobs(12, 3);
        let a = Tsne::new(5.0, 1).with_config(fast_config()).reduce(&points, 2).unwrap();
        let b = Tsne::new(5.0, 2).with_config(fast_config()).reduce(&points, 2).unwrap();
        assert_ne!(a.points, b.points);
    }

    #[test]
    fn pca_init_is_seed_independent() {
        let points = two_blobs(12, 3);
        let config = TsneConfig {
            init: TsneInit::Pca,
            ..fast_config()
        };
        let a = Tsne::new(5.0, 1).with_config(config.clone()).reduce(&points, 2).unwrap();
        let b = Tsne::new(5.0, 2).with_config(config).reduce(&points, 2).unwrap();
        assert_eq!(pairwise_distances(&a.points), pairwise_distances(&b.points));
    }

    #[test]
    fn perplexity_at_sample_count_rejected() {
        let points = two_blobs(5, 2);
        let result = Tsne::new(10.0, 0).reduce(&points, 2);
        assert!(matches!(result, Err(MetricError::InvalidParameter(_))));
    }

    #[test]
    fn non_positive_perplexity_rejected() {
        let points = two_blobs(5, 2);
        assert!(matches!(
            Tsne::new(0.0, 0).reduce(&points, 2),
            Err(MetricError::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_target_dims_rejected() {
        let points = two_blobs(5, 2);
        assert!(matches!(
            Tsne::new(2.0, 0).reduce(&points, 0),
            Err(MetricError::InvalidParameter(_))
        ));
    }

    #[test]
    fn auto_learning_rate_has_floor() {
        let tsne = Tsne::new(30.0, 0);
        assert_eq!(tsne.learning_rate(100), 50.0);
        assert_eq!(tsne.learning_rate(4800), 100.0);
    }

    fn optimizer_fixture(min_grad_norm: f64) -> (Vec<f64>, Vec<f64>, Optimizer) {
        let points = two_blobs(10, 3);
        let tsne = Tsne::new(5.0, 3);
        let p = joint_probabilities(&points, 5.0);
        let y = tsne.initial_layout(&points, 2).unwrap();
        let optimizer = Optimizer::new(20, 2, 50.0, 0.5, min_grad_norm);
        (p, y, optimizer)
    }

    #[test]
    fn convergence_is_only_tested_on_check_iterations() {
        // Any gradient passes an infinite threshold, so each phase stops at
        // its first check iteration and never before it.
        let (p, mut y, mut optimizer) = optimizer_fixture(f64::INFINITY);
        assert_eq!(optimizer.run(&p, &mut y, 0..30, 250), 30);
        assert_eq!(optimizer.run(&p, &mut y, 0..250, 250), 50);
        assert_eq!(optimizer.run(&p, &mut y, 50..1000, 300), 100);
    }

    #[test]
    fn zero_threshold_runs_the_whole_range() {
        let (p, mut y, mut optimizer) = optimizer_fixture(0.0);
        assert_eq!(optimizer.run(&p, &mut y, 0..120, usize::MAX), 120);
    }

    #[test]
    fn divergence_is_reported_only_when_requested() {
        let (p, y, mut optimizer) = optimizer_fixture(0.0);
        let error = optimizer.gradient(&p, &y, true);
        assert!(error.is_finite() && error > 0.0, "{}", error);
        assert_eq!(optimizer.gradient(&p, &y, false), 0.0);
    }
}
