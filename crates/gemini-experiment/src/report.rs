//! Aggregation and rendering of a result set
//!
//! The run itself only produces records; everything here is a pure view
//! over a [`ResultSet`].

use crate::record::{Experiment, MetricRecord, ResultSet, ScoreKind};
use serde::Serialize;
use std::fmt::Write;

/// Mean and spread of one (experiment, dataset) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub experiment: Experiment,
    pub dataset: String,
    pub score_kind: ScoreKind,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1); NaN for a single record
    pub std: f64,
}

/// Group scores by (experiment, dataset) in first-seen order.
pub fn summarize(results: &ResultSet) -> Vec<SummaryRow> {
    let mut groups: Vec<(Experiment, &str, ScoreKind, Vec<f64>)> = Vec::new();
    for record in results {
        let kind = record.score.kind();
        match groups
            .iter_mut()
            .find(|(e, d, k, _)| *e == record.experiment && *d == record.dataset && *k == kind)
        {
            Some((_, _, _, scores)) => scores.push(record.score.value()),
            None => groups.push((
                record.experiment,
                record.dataset.as_str(),
                kind,
                vec![record.score.value()],
            )),
        }
    }

    groups
        .into_iter()
        .map(|(experiment, dataset, score_kind, scores)| {
            let (mean, std) = mean_std(&scores);
            SummaryRow {
                experiment,
                dataset: dataset.to_string(),
                score_kind,
                count: scores.len(),
                mean,
                std,
            }
        })
        .collect()
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (mean, f64::NAN);
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (ss / (n - 1) as f64).sqrt())
}

/// Score against parameter value for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub experiment: Experiment,
    /// `(parameter value, score)` in run order
    pub points: Vec<(f64, f64)>,
}

/// One series per experiment, in first-seen order.
pub fn scatter_series(results: &ResultSet) -> Vec<ScatterSeries> {
    let mut series: Vec<ScatterSeries> = Vec::new();
    for record in results {
        let point = (record.parameter.value(), record.score.value());
        match series.iter_mut().find(|s| s.experiment == record.experiment) {
            Some(s) => s.points.push(point),
            None => series.push(ScatterSeries {
                experiment: record.experiment,
                points: vec![point],
            }),
        }
    }
    series
}

/// Everything a run produced, as emitted by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    pub records: &'a ResultSet,
    pub summary: Vec<SummaryRow>,
    pub series: Vec<ScatterSeries>,
}

impl<'a> Report<'a> {
    pub fn new(records: &'a ResultSet) -> Self {
        Self {
            records,
            summary: summarize(records),
            series: scatter_series(records),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn parameter_cell(record: &MetricRecord) -> String {
    format!("{} {}", record.parameter.label(), record.parameter.value())
}

/// Raw records, one line each.
pub fn render_records(results: &ResultSet) -> String {
    let dataset_width = column_width(results.iter().map(|r| r.dataset.len()), "Dataset");
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<dw$}  {:<22}  {:>4}  {:<18}  {:<15}  {:>12}",
        "Trial",
        "Dataset",
        "Experiment",
        "Step",
        "Parameter",
        "Score",
        "Value",
        dw = dataset_width
    );
    for record in results {
        let step = record.step.map(|s| s.to_string()).unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>5}  {:<dw$}  {:<22}  {:>4}  {:<18}  {:<15}  {:>12.6}",
            record.trial,
            record.dataset,
            record.experiment.as_str(),
            step,
            parameter_cell(record),
            record.score.kind().to_string(),
            record.score.value(),
            dw = dataset_width
        );
    }
    out
}

/// Per-group mean and std.
pub fn render_summary(rows: &[SummaryRow]) -> String {
    let dataset_width = column_width(rows.iter().map(|r| r.dataset.len()), "Dataset");
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<22}  {:<dw$}  {:<15}  {:>5}  {:>12}  {:>12}",
        "Experiment",
        "Dataset",
        "Score",
        "N",
        "mean",
        "std",
        dw = dataset_width
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<22}  {:<dw$}  {:<15}  {:>5}  {:>12.6}  {:>12.6}",
            row.experiment.as_str(),
            row.dataset,
            row.score_kind.to_string(),
            row.count,
            row.mean,
            row.std,
            dw = dataset_width
        );
    }
    out
}

fn column_width(lengths: impl Iterator<Item = usize>, header: &str) -> usize {
    lengths.max().unwrap_or(0).max(header.len())
}
