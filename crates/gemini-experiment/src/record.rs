//! Metric records and the append-only result set

use gemini_core::ViscosityInputs;
use serde::{Deserialize, Serialize};

/// The three experiment protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Experiment {
    /// One embedding per perplexity value
    #[serde(rename = "Shear Rate Dependence")]
    ShearRateDependence,
    /// Forward then backward perplexity sweep
    #[serde(rename = "Hysteresis")]
    Hysteresis,
    /// PCA round trip, deformation of the reconstruction
    #[serde(rename = "Viscoelasticity")]
    Viscoelasticity,
}

impl Experiment {
    pub const ALL: [Experiment; 3] = [
        Self::ShearRateDependence,
        Self::Hysteresis,
        Self::Viscoelasticity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShearRateDependence => "Shear Rate Dependence",
            Self::Hysteresis => "Hysteresis",
            Self::Viscoelasticity => "Viscoelasticity",
        }
    }

    /// Stable numeric id, mixed into per-step seeds.
    pub(crate) fn code(&self) -> u64 {
        match self {
            Self::ShearRateDependence => 1,
            Self::Hysteresis => 2,
            Self::Viscoelasticity => 3,
        }
    }
}

impl std::fmt::Display for Experiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The protocol-specific parameter a record was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Perplexity(u32),
    PcaComponents(usize),
}

impl Parameter {
    /// Numeric value, for plotting score against parameter.
    pub fn value(&self) -> f64 {
        match self {
            Self::Perplexity(p) => *p as f64,
            Self::PcaComponents(k) => *k as f64,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Perplexity(_) => "Perplexity",
            Self::PcaComponents(_) => "PCA Components",
        }
    }
}

/// Which quantity a record's score holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreKind {
    #[serde(rename = "Viscosity Score")]
    Viscosity,
    #[serde(rename = "Recovery")]
    Recovery,
}

impl std::fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Viscosity => write!(f, "Viscosity Score"),
            Self::Recovery => write!(f, "Recovery"),
        }
    }
}

/// A record's score: a composed viscosity or a standalone recovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Viscosity(f64),
    Recovery(f64),
}

impl Score {
    pub fn value(&self) -> f64 {
        match self {
            Self::Viscosity(v) | Self::Recovery(v) => *v,
        }
    }

    pub fn kind(&self) -> ScoreKind {
        match self {
            Self::Viscosity(_) => ScoreKind::Viscosity,
            Self::Recovery(_) => ScoreKind::Recovery,
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub trial: usize,
    pub dataset: String,
    pub experiment: Experiment,
    /// 1-based sweep position, hysteresis only
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub step: Option<usize>,
    pub parameter: Parameter,
    pub score: Score,
    /// Raw estimator outputs behind a viscosity score
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estimates: Option<ViscosityInputs>,
}

/// Ordered, append-only sequence of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<MetricRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MetricRecord) {
        self.records.push(record);
    }

    /// Append another sub-sequence in order.
    pub fn extend(&mut self, other: ResultSet) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricRecord> {
        self.records.iter()
    }

    /// Records of one experiment, in run order.
    pub fn by_experiment(&self, experiment: Experiment) -> impl Iterator<Item = &MetricRecord> {
        self.records
            .iter()
            .filter(move |r| r.experiment == experiment)
    }

    /// Records of one experiment on one dataset, in run order.
    pub fn filter<'a>(
        &'a self,
        experiment: Experiment,
        dataset: &'a str,
    ) -> impl Iterator<Item = &'a MetricRecord> + 'a {
        self.by_experiment(experiment)
            .filter(move |r| r.dataset == dataset)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a MetricRecord;
    type IntoIter = std::slice::Iter<'a, MetricRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
