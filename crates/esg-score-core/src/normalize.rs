use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

const PERCENT_PRECISION: f64 = 1e9;

/// Rounds a percentage to nine decimal places so accumulated float error
/// cannot push a value across a band edge.
pub fn snap_percentage(pct: f64) -> f64 {
    (pct * PERCENT_PRECISION).round() / PERCENT_PRECISION
}

/// Maps a raw score in `[-1, 1]` linearly onto `[0, 100]`.
pub fn percentage(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    snap_percentage((((score + 1.0) / 2.0) * 100.0).clamp(0.0, 100.0))
}

/// Inverse of [`percentage`].
pub fn score_from_percentage(pct: f64) -> f64 {
    if pct.is_nan() {
        return -1.0;
    }
    (pct.clamp(0.0, 100.0) / 50.0) - 1.0
}

/// Lower bounds (inclusive) for 2, 3, 4 and 5 stars. Anything below the
/// first bound is one star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StarBands {
    pub minimums: [f64; 4],
}

impl Default for StarBands {
    fn default() -> Self {
        Self {
            minimums: [40.0, 60.0, 75.0, 90.0],
        }
    }
}

impl StarBands {
    pub fn stars(&self, pct: f64) -> u8 {
        let reached = self.minimums.iter().filter(|min| pct >= **min).count();
        1 + u8::try_from(reached).unwrap_or(4)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        check_ascending("star", &self.minimums)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    /// Every grade above `F`, best first. Indexes line up with
    /// [`GradeBands::minimums`].
    pub const RANKED: [Self; 11] = [
        Self::APlus,
        Self::A,
        Self::AMinus,
        Self::BPlus,
        Self::B,
        Self::BMinus,
        Self::CPlus,
        Self::C,
        Self::CMinus,
        Self::DPlus,
        Self::D,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::DPlus => "D+",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive lower bounds for `A+` down to `D`, strictly descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeBands {
    pub minimums: [f64; 11],
}

impl Default for GradeBands {
    fn default() -> Self {
        Self {
            minimums: [
                97.0, 93.0, 90.0, 87.0, 83.0, 80.0, 77.0, 73.0, 70.0, 67.0, 60.0,
            ],
        }
    }
}

impl GradeBands {
    pub fn grade(&self, pct: f64) -> Grade {
        Grade::RANKED
            .into_iter()
            .zip(self.minimums)
            .find(|(_, min)| pct >= *min)
            .map_or(Grade::F, |(grade, _)| grade)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        let mut ascending = self.minimums;
        ascending.reverse();
        check_ascending("grade", &ascending)
    }
}

fn check_ascending(kind: &str, bounds: &[f64]) -> Result<(), ScoringError> {
    if bounds
        .iter()
        .any(|b| !b.is_finite() || *b < 0.0 || *b > 100.0)
    {
        return Err(ScoringError::InvalidBands(format!(
            "{kind} thresholds must lie in [0, 100]"
        )));
    }
    if bounds.windows(2).any(|w| matches!(w, [lo, hi] if lo >= hi)) {
        return Err(ScoringError::InvalidBands(format!(
            "{kind} thresholds must be strictly ordered"
        )));
    }
    Ok(())
}

/// A percentage together with its star and grade readings. Stars and grade
/// are both derived from the percentage, never from each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub percentage: f64,
    pub stars: u8,
    pub grade: Grade,
}

impl Normalized {
    pub fn from_percentage(pct: f64, stars: &StarBands, grades: &GradeBands) -> Self {
        let percentage = if pct.is_nan() {
            0.0
        } else {
            snap_percentage(pct.clamp(0.0, 100.0))
        };
        Self {
            percentage,
            stars: stars.stars(percentage),
            grade: grades.grade(percentage),
        }
    }
}
