//! Run configuration

use crate::error::{ExperimentError, Result};
use crate::record::Experiment;
use gemini_core::estimate::EntropyEstimator;
use gemini_core::reduce::TsneConfig;
use gemini_core::VISCOSITY_TARGET_DIMS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Experiment runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of independent trials (default: 5)
    pub n_trials: usize,
    /// Seed of trial 0; trial `t` uses `base_seed + t` (default: 0)
    pub base_seed: u64,
    /// Perplexity sweep for the embedding protocols (default: 5, 10, 30, 50, 100)
    pub perplexities: Vec<u32>,
    /// Retained components for the viscoelasticity round trip (default: 10)
    pub pca_components: usize,
    /// Embedding dimensionality (default: 2, the only supported value)
    pub target_dims: usize,
    /// Protocols to run, in order (default: all three)
    pub experiments: Vec<Experiment>,
    pub entropy: EntropyEstimator,
    pub tsne: TsneConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            n_trials: 5,
            base_seed: 0,
            perplexities: vec![5, 10, 30, 50, 100],
            pca_components: 10,
            target_dims: VISCOSITY_TARGET_DIMS,
            experiments: Experiment::ALL.to_vec(),
            entropy: EntropyEstimator::default(),
            tsne: TsneConfig::default(),
        }
    }
}

impl RunConfig {
    /// Check settings that do not depend on the datasets.
    pub fn validate(&self) -> Result<()> {
        if self.n_trials == 0 {
            return Err(ExperimentError::Config(
                "n_trials must be at least 1".to_string(),
            ));
        }
        if self.experiments.is_empty() {
            return Err(ExperimentError::Config(
                "at least one experiment must be enabled".to_string(),
            ));
        }
        let sweeps = self
            .experiments
            .iter()
            .any(|e| matches!(e, Experiment::ShearRateDependence | Experiment::Hysteresis));
        if sweeps && self.perplexities.is_empty() {
            return Err(ExperimentError::Config(
                "perplexity list is empty".to_string(),
            ));
        }
        if let Some(p) = self.perplexities.iter().find(|&&p| p == 0) {
            return Err(ExperimentError::Config(format!(
                "perplexity must be positive, got {}",
                p
            )));
        }
        if self.pca_components == 0 {
            return Err(ExperimentError::Config(
                "pca_components must be at least 1".to_string(),
            ));
        }
        // The viscosity correction term is defined against a 2D target.
        if self.target_dims != VISCOSITY_TARGET_DIMS {
            return Err(ExperimentError::Config(format!(
                "target_dims {} is unsupported: the viscosity formula is coupled to {}D targets",
                self.target_dims, VISCOSITY_TARGET_DIMS
            )));
        }
        if self.entropy.n_samples == 0 {
            return Err(ExperimentError::Config(
                "entropy sample count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Seed shared by every stochastic call in trial `trial`.
    pub fn trial_seed(&self, trial: usize) -> u64 {
        self.base_seed.wrapping_add(trial as u64)
    }
}

/// Synthetic dataset settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Rows per dataset (default: 1000)
    pub n_samples: usize,
    /// Features per dataset (default: 30)
    pub n_features: usize,
    /// Generation seed (default: 42)
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            n_features: 30,
            seed: 42,
        }
    }
}

/// Complete configuration file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub run: RunConfig,
    pub datasets: DatasetConfig,
}

impl GeminiConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
