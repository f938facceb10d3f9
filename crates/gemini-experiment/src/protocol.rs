//! Per-step computations of the three protocols
//!
//! Each step builds exactly one reduction of one standardized dataset and
//! folds the estimates into a single score. Nothing is shared between
//! datasets; within one (trial, dataset) pair only the source curvature is
//! computed once, since it is deterministic.

use crate::config::RunConfig;
use crate::dataset::Dataset;
use crate::record::Experiment;
use gemini_core::estimate::{curvature, deformation};
use gemini_core::reduce::{InvertibleReducer, Pca, Reducer, Tsne};
use gemini_core::{MetricError, ViscosityInputs, VISCOSITY_TARGET_DIMS};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Forward sweep followed by its reverse, with 1-based step indices.
///
/// `[5, 10, 30]` becomes `(1,5) (2,10) (3,30) (4,30) (5,10) (6,5)`.
pub fn hysteresis_schedule(values: &[u32]) -> Vec<(usize, u32)> {
    values
        .iter()
        .chain(values.iter().rev())
        .copied()
        .enumerate()
        .map(|(i, v)| (i + 1, v))
        .collect()
}

/// Mix several integers into one well-spread seed (splitmix64 finalizer).
pub(crate) fn derive_seed(parts: &[u64]) -> u64 {
    parts.iter().fold(0x9E37_79B9_7F4A_7C15_u64, |acc, &part| {
        let mut z = acc ^ part.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    })
}

/// Everything one (trial, dataset) pair needs to run its protocols.
pub(crate) struct TrialContext<'a> {
    pub trial: usize,
    pub dataset_index: usize,
    pub dataset: &'a Dataset,
    pub seed: u64,
    pub source_curvature: f64,
    config: &'a RunConfig,
}

impl<'a> TrialContext<'a> {
    /// `dataset` must already be standardized.
    pub fn new(
        trial: usize,
        dataset_index: usize,
        dataset: &'a Dataset,
        config: &'a RunConfig,
    ) -> Result<Self, MetricError> {
        let source_curvature = curvature(&dataset.points, VISCOSITY_TARGET_DIMS)?;
        Ok(Self {
            trial,
            dataset_index,
            dataset,
            seed: config.trial_seed(trial),
            source_curvature,
            config,
        })
    }

    /// Resampling stream for the entropy estimates of one step.
    fn entropy_rng(&self, experiment: Experiment, step: usize) -> StdRng {
        StdRng::seed_from_u64(derive_seed(&[
            self.seed,
            self.dataset_index as u64,
            experiment.code(),
            step as u64,
        ]))
    }

    /// Embed at `perplexity` and collect the viscosity inputs.
    ///
    /// `step` is the 0-based position within the protocol's sweep.
    pub fn embed_and_measure(
        &self,
        experiment: Experiment,
        step: usize,
        perplexity: u32,
    ) -> Result<ViscosityInputs, MetricError> {
        let source = &self.dataset.points;
        let tsne = Tsne::new(perplexity as f64, self.seed).with_config(self.config.tsne.clone());
        let reduced = tsne.reduce(source, self.config.target_dims)?;

        let mut rng = self.entropy_rng(experiment, step);
        let source_entropy = self.config.entropy.estimate(source, &mut rng)?;
        let reduced_entropy = self.config.entropy.estimate(&reduced.points, &mut rng)?;
        let deformation = deformation(source, &reduced.points)?;

        Ok(ViscosityInputs {
            source_entropy,
            reduced_entropy,
            source_curvature: self.source_curvature,
            deformation,
        })
    }

    /// PCA round trip; deformation between the source and its reconstruction.
    pub fn recovery(&self) -> Result<f64, MetricError> {
        let source = &self.dataset.points;
        let (model, reduced) = Pca.fit_reduce(source, self.config.pca_components)?;
        let reconstructed = Pca.reconstruct(&model, &reduced)?;
        deformation(source, &reconstructed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn schedule_mirrors_the_sweep() {
        let schedule = hysteresis_schedule(&[5, 10, 30]);
        assert_eq!(
            schedule,
            vec![(1, 5), (2, 10), (3, 30), (4, 30), (5, 10), (6, 5)]
        );
    }

    #[test]
    fn schedule_of_empty_list_is_empty() {
        assert!(hysteresis_schedule(&[]).is_empty());
    }

    #[test]
    fn derived_seeds_depend_on_every_part() {
        let base = derive_seed(&[1, 2, 3]);
        assert_eq!(base, derive_seed(&[1, 2, 3]));
        assert_ne!(base, derive_seed(&[1, 2, 4]));
        assert_ne!(base, derive_seed(&[2, 1, 3]));
        assert_ne!(base, derive_seed(&[1, 2]));
    }
}
