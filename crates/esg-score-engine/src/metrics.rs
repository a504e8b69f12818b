use chrono::{DateTime, Utc};
use esg_score_core::{Grade, Pillar, PillarSource};
use serde::{Deserialize, Serialize};

use crate::validation::ValidationMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarScore {
    pub pillar: Pillar,
    /// Weighted raw score in `[-1, 1]`; -1 when the pillar has no data.
    pub score: f64,
    /// Percentage of `score`, so 0 when the pillar has no data.
    pub percentage: f64,
    pub claim_count: usize,
    pub source: PillarSource,
}

impl PillarScore {
    /// A pillar with no data contributes 0% to the overall score.
    pub const fn empty(pillar: Pillar) -> Self {
        Self {
            pillar,
            score: -1.0,
            percentage: 0.0,
            claim_count: 0,
            source: PillarSource::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarScores {
    pub environmental: PillarScore,
    pub social: PillarScore,
    pub governance: PillarScore,
}

impl PillarScores {
    pub const fn get(&self, pillar: Pillar) -> &PillarScore {
        match pillar {
            Pillar::Environmental => &self.environmental,
            Pillar::Social => &self.social,
            Pillar::Governance => &self.governance,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PillarScore> {
        [&self.environmental, &self.social, &self.governance].into_iter()
    }
}

/// Validation counts carried inside a scorecard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationTotals {
    pub total_ratings: usize,
    pub endorsements: usize,
    pub rejections: usize,
    pub endorsement_rate: f64,
}

impl From<&ValidationMetrics> for ValidationTotals {
    fn from(m: &ValidationMetrics) -> Self {
        Self {
            total_ratings: m.total_ratings,
            endorsements: m.endorsements,
            rejections: m.rejections,
            endorsement_rate: m.endorsement_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgMetrics {
    /// Raw overall score in `[-1, 1]`, the inverse mapping of
    /// `overall_percentage`.
    pub overall_score: f64,
    /// Weighted sum of the pillar percentages.
    pub overall_percentage: f64,
    pub overall_stars: u8,
    pub grade: Grade,
    pub pillars: PillarScores,
    pub confidence: f64,
    pub percentile: f64,
    /// Claims that took part in aggregation.
    pub claim_count: usize,
    pub validation: ValidationTotals,
    pub computed_at: DateTime<Utc>,
}

/// A computed value together with every consistency problem found in it.
/// The value is never altered by the check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checked<T> {
    pub value: T,
    pub warnings: Vec<Inconsistency>,
}

impl<T> Checked<T> {
    pub const fn new(value: T, warnings: Vec<Inconsistency>) -> Self {
        Self { value, warnings }
    }

    pub fn is_consistent(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InconsistencyKind {
    NotFinite,
    OutOfRange,
    OverallMismatch,
    EndorsementRateMismatch,
    BucketOverflow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inconsistency {
    pub kind: InconsistencyKind,
    pub field: String,
    pub message: String,
}

impl Inconsistency {
    pub fn new(
        kind: InconsistencyKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}
