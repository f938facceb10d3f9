//! GEMINI Experiments
//!
//! Runs the three protocols of the GEMINI analysis over a collection of
//! named datasets and collects one [`MetricRecord`] per measurement:
//!
//! - **Shear Rate Dependence**: one t-SNE embedding per perplexity
//! - **Hysteresis**: the perplexity sweep forward, then backward
//! - **Viscoelasticity**: PCA round trip, deformation of the reconstruction
//!
//! # Example
//!
//! ```rust,no_run
//! use gemini_experiment::{
//!     generate_datasets, summarize, CancelToken, DatasetConfig, RunConfig, Runner,
//! };
//!
//! let datasets = generate_datasets(&DatasetConfig::default())?;
//! let runner = Runner::new(RunConfig::default())?;
//! let results = runner.run(&datasets, &CancelToken::new())?;
//! for row in summarize(&results) {
//!     println!("{} / {}: {:.4}", row.experiment, row.dataset, row.mean);
//! }
//! # Ok::<(), gemini_experiment::ExperimentError>(())
//! ```

pub mod cancel;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
mod protocol;
pub mod record;
pub mod report;
pub mod runner;
pub mod standardize;

pub use cancel::CancelToken;
pub use config::{DatasetConfig, GeminiConfig, RunConfig};
pub use dataset::{generate_datasets, Dataset, DatasetCollection};
pub use error::{ExperimentError, Result};
pub use protocol::hysteresis_schedule;
pub use record::{Experiment, MetricRecord, Parameter, ResultSet, Score, ScoreKind};
pub use report::{render_records, render_summary, scatter_series, summarize, Report, SummaryRow};
pub use runner::Runner;
pub use standardize::standardize;
