//! Experiment runner
//!
//! Nested deterministic loops: trial → dataset → protocol → step. Every
//! stochastic call receives a seed derived from the trial index (and, for
//! entropy resampling, the dataset and step), so a (trial, dataset) pair can
//! be re-run in isolation with [`Runner::run_pair`] and produce the same
//! records it produces inside a full run.
//!
//! Failure policy is fail-fast: the first failing record aborts the run and
//! no partial result set is returned.

use crate::cancel::CancelToken;
use crate::config::RunConfig;
use crate::dataset::{Dataset, DatasetCollection};
use crate::error::{ExperimentError, Result};
use crate::logging::prefix;
use crate::protocol::{hysteresis_schedule, TrialContext};
use crate::record::{Experiment, MetricRecord, Parameter, ResultSet, Score};
use gemini_core::MetricError;
use std::time::Instant;
use tracing::{debug, info};

/// Runs the configured protocols over a dataset collection.
pub struct Runner {
    config: RunConfig,
}

impl Runner {
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every trial over every dataset.
    ///
    /// Datasets are standardized once, before any protocol runs.
    pub fn run(&self, datasets: &DatasetCollection, cancel: &CancelToken) -> Result<ResultSet> {
        self.check_datasets(datasets)?;
        info!(
            "{} Standardizing {} datasets: {}",
            prefix::DATA,
            datasets.len(),
            datasets.names().join(", ")
        );
        let prepared = datasets.standardized()?;

        let start = Instant::now();
        let mut results = ResultSet::new();
        for trial in 0..self.config.n_trials {
            info!(
                "{} Starting trial {}/{} (seed {})",
                prefix::TRIAL,
                trial + 1,
                self.config.n_trials,
                self.config.trial_seed(trial)
            );
            for (index, dataset) in prepared.iter().enumerate() {
                info!("Analyzing dataset: {}", dataset.name);
                results.extend(self.run_pair(trial, index, dataset, cancel)?);
            }
        }

        info!(
            "{} Run complete: {} records in {}ms",
            prefix::DONE,
            results.len(),
            start.elapsed().as_millis()
        );
        Ok(results)
    }

    /// Run all enabled protocols for one (trial, dataset) pair.
    ///
    /// `dataset` must already be standardized and `dataset_index` must be its
    /// position in the collection, since both feed the derived seeds.
    pub fn run_pair(
        &self,
        trial: usize,
        dataset_index: usize,
        dataset: &Dataset,
        cancel: &CancelToken,
    ) -> Result<ResultSet> {
        let ctx = TrialContext::new(trial, dataset_index, dataset, &self.config).map_err(
            |source| ExperimentError::Dataset {
                dataset: dataset.name.clone(),
                source,
            },
        )?;

        let mut results = ResultSet::new();
        for &experiment in &self.config.experiments {
            match experiment {
                Experiment::ShearRateDependence => self.shear_rate(&ctx, cancel, &mut results)?,
                Experiment::Hysteresis => self.hysteresis(&ctx, cancel, &mut results)?,
                Experiment::Viscoelasticity => {
                    self.viscoelasticity(&ctx, cancel, &mut results)?
                }
            }
        }
        Ok(results)
    }

    /// Reject parameter/dataset combinations before any transform runs.
    fn check_datasets(&self, datasets: &DatasetCollection) -> Result<()> {
        if datasets.is_empty() {
            return Err(ExperimentError::Config("no datasets to analyze".to_string()));
        }

        let sweeps = self
            .config
            .experiments
            .iter()
            .any(|e| matches!(e, Experiment::ShearRateDependence | Experiment::Hysteresis));
        let round_trip = self.config.experiments.contains(&Experiment::Viscoelasticity);
        let max_perplexity = self.config.perplexities.iter().copied().max().unwrap_or(0);

        for dataset in datasets.iter() {
            let (n, d) = (dataset.points.n_points(), dataset.points.n_dims());
            let invalid = |msg: String| ExperimentError::Dataset {
                dataset: dataset.name.clone(),
                source: MetricError::InvalidParameter(msg),
            };
            if sweeps && max_perplexity as usize >= n {
                return Err(invalid(format!(
                    "perplexity {} must be less than the number of samples {}",
                    max_perplexity, n
                )));
            }
            if round_trip && self.config.pca_components > d {
                return Err(invalid(format!(
                    "requested {} PCA components but dataset has {} features",
                    self.config.pca_components, d
                )));
            }
        }
        Ok(())
    }

    fn checkpoint(
        &self,
        ctx: &TrialContext<'_>,
        experiment: Experiment,
        cancel: &CancelToken,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            info!(
                "{} Cancellation requested at trial {}, {}",
                prefix::DONE,
                ctx.trial,
                experiment
            );
            return Err(ExperimentError::Cancelled {
                trial: ctx.trial,
                dataset: ctx.dataset.name.clone(),
                experiment,
            });
        }
        Ok(())
    }

    fn record_error(
        ctx: &TrialContext<'_>,
        experiment: Experiment,
    ) -> impl Fn(MetricError) -> ExperimentError {
        let trial = ctx.trial;
        let dataset = ctx.dataset.name.clone();
        move |source| ExperimentError::Record {
            trial,
            dataset: dataset.clone(),
            experiment,
            source,
        }
    }

    fn viscosity_record(
        &self,
        ctx: &TrialContext<'_>,
        experiment: Experiment,
        position: usize,
        step: Option<usize>,
        perplexity: u32,
    ) -> Result<MetricRecord> {
        let to_error = Self::record_error(ctx, experiment);
        let inputs = ctx
            .embed_and_measure(experiment, position, perplexity)
            .map_err(&to_error)?;
        let score = inputs.score().map_err(&to_error)?;

        debug!(
            "{} {} perplexity {}: E0={:.4} E1={:.4} C0={:.4} D={:.4} -> {:.6}",
            ctx.dataset.name,
            experiment,
            perplexity,
            inputs.source_entropy,
            inputs.reduced_entropy,
            inputs.source_curvature,
            inputs.deformation,
            score
        );

        Ok(MetricRecord {
            trial: ctx.trial,
            dataset: ctx.dataset.name.clone(),
            experiment,
            step,
            parameter: Parameter::Perplexity(perplexity),
            score: Score::Viscosity(score),
            estimates: Some(inputs),
        })
    }

    fn shear_rate(
        &self,
        ctx: &TrialContext<'_>,
        cancel: &CancelToken,
        results: &mut ResultSet,
    ) -> Result<()> {
        let experiment = Experiment::ShearRateDependence;
        for (position, &perplexity) in self.config.perplexities.iter().enumerate() {
            self.checkpoint(ctx, experiment, cancel)?;
            results.push(self.viscosity_record(ctx, experiment, position, None, perplexity)?);
        }
        Ok(())
    }

    fn hysteresis(
        &self,
        ctx: &TrialContext<'_>,
        cancel: &CancelToken,
        results: &mut ResultSet,
    ) -> Result<()> {
        let experiment = Experiment::Hysteresis;
        for (step, perplexity) in hysteresis_schedule(&self.config.perplexities) {
            self.checkpoint(ctx, experiment, cancel)?;
            results.push(self.viscosity_record(ctx, experiment, step - 1, Some(step), perplexity)?);
        }
        Ok(())
    }

    fn viscoelasticity(
        &self,
        ctx: &TrialContext<'_>,
        cancel: &CancelToken,
        results: &mut ResultSet,
    ) -> Result<()> {
        let experiment = Experiment::Viscoelasticity;
        self.checkpoint(ctx, experiment, cancel)?;
        let recovery = ctx
            .recovery()
            .map_err(Self::record_error(ctx, experiment))?;

        debug!(
            "{} {} with {} components: recovery {:.6}",
            ctx.dataset.name, experiment, self.config.pca_components, recovery
        );

        results.push(MetricRecord {
            trial: ctx.trial,
            dataset: ctx.dataset.name.clone(),
            experiment,
            step: None,
            parameter: Parameter::PcaComponents(self.config.pca_components),
            score: Score::Recovery(recovery),
            estimates: None,
        });
        Ok(())
    }
}
