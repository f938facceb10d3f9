//! Named datasets and synthetic dataset generation

use crate::config::DatasetConfig;
use crate::error::{ExperimentError, Result};
use crate::standardize::standardize;
use gemini_core::PointSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};
use tracing::debug;

pub const STRUCTURED: &str = "High Viscosity (Structured)";
pub const EMBEDDINGS: &str = "Medium Viscosity (Embeddings)";
pub const NOISE: &str = "Low Viscosity (Noise)";

/// A named point set used as a fixed experimental subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub points: PointSet,
}

impl Dataset {
    pub fn new(name: impl Into<String>, points: PointSet) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Ordered collection of datasets with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetCollection {
    datasets: Vec<Dataset>,
}

impl DatasetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dataset. Names are identities, so duplicates are rejected.
    pub fn insert(&mut self, dataset: Dataset) -> Result<()> {
        if self.get(&dataset.name).is_some() {
            return Err(ExperimentError::Config(format!(
                "duplicate dataset name '{}'",
                dataset.name
            )));
        }
        self.datasets.push(dataset);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Copy of the collection with every dataset standardized.
    pub fn standardized(&self) -> Result<Self> {
        let datasets = self
            .datasets
            .iter()
            .map(|d| {
                standardize(&d.points)
                    .map(|points| Dataset::new(d.name.clone(), points))
                    .map_err(|source| ExperimentError::Dataset {
                        dataset: d.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { datasets })
    }
}

fn sample_matrix<D, R>(rows: usize, cols: usize, dist: &D, rng: &mut R) -> Result<PointSet>
where
    D: Distribution<f64>,
    R: Rng + ?Sized,
{
    let values = (0..rows * cols).map(|_| dist.sample(rng)).collect();
    PointSet::from_shape_vec(rows, cols, values)
        .map_err(|e| ExperimentError::Config(format!("dataset synthesis failed: {}", e)))
}

/// Generate the three reference datasets from one seeded stream.
///
/// - structured: half the rows from N(0, 1), half from N(5, 1)
/// - embeddings: all rows from N(0, 1)
/// - noise: all rows from U(-1, 1)
pub fn generate_datasets(config: &DatasetConfig) -> Result<DatasetCollection> {
    if config.n_samples < 2 || config.n_features == 0 {
        return Err(ExperimentError::Config(format!(
            "datasets need at least 2 samples and 1 feature, got {}x{}",
            config.n_samples, config.n_features
        )));
    }

    let (n, d) = (config.n_samples, config.n_features);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let unit = Normal::new(0.0, 1.0).map_err(|e| ExperimentError::Config(e.to_string()))?;
    let shifted = Normal::new(5.0, 1.0).map_err(|e| ExperimentError::Config(e.to_string()))?;
    let noise = Uniform::new(-1.0, 1.0);

    let half = n / 2;
    let low = sample_matrix(half, d, &unit, &mut rng)?;
    let high = sample_matrix(half, d, &shifted, &mut rng)?;
    let structured = low
        .stack(&high)
        .map_err(|e| ExperimentError::Config(e.to_string()))?;
    let embeddings = sample_matrix(n, d, &unit, &mut rng)?;
    let uniform = sample_matrix(n, d, &noise, &mut rng)?;

    debug!("Generated 3 datasets of {}x{} (seed {})", n, d, config.seed);

    let mut collection = DatasetCollection::new();
    collection.insert(Dataset::new(STRUCTURED, structured))?;
    collection.insert(Dataset::new(EMBEDDINGS, embeddings))?;
    collection.insert(Dataset::new(NOISE, uniform))?;
    Ok(collection)
}
