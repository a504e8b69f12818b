use serde::{Deserialize, Serialize};

use crate::error::ScoringError;
use crate::normalize::{GradeBands, StarBands};
use crate::pillar::{Pillar, PillarKeywords};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarWeights {
    pub environmental: f64,
    pub social: f64,
    pub governance: f64,
}

impl Default for PillarWeights {
    fn default() -> Self {
        Self {
            environmental: 0.4,
            social: 0.3,
            governance: 0.3,
        }
    }
}

impl PillarWeights {
    pub const fn weight(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Environmental => self.environmental,
            Pillar::Social => self.social,
            Pillar::Governance => self.governance,
        }
    }

    /// `Σ weight × value` over the three pillars.
    pub fn combine(&self, value: impl Fn(Pillar) -> f64) -> f64 {
        Pillar::ALL
            .into_iter()
            .map(|pillar| self.weight(pillar) * value(pillar))
            .sum()
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        let all = [self.environmental, self.social, self.governance];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ScoringError::InvalidWeights(
                "weights must be finite and non-negative".to_string(),
            ));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must sum to 1, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Allowed drift between values the consistency check recomputes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Percentage points between the overall score and the weighted pillar sum.
    pub overall_points: f64,
    /// Percentage points between the endorsement rate and its counts.
    pub endorsement_rate_points: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            overall_points: 0.5,
            endorsement_rate_points: 0.1,
        }
    }
}

/// Every tunable the scorecard computation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub pillar_weights: PillarWeights,
    /// Recency decay constant in days: a claim this old weighs `1/e`.
    pub decay_days: f64,
    /// Confidence assumed for claims that carry none.
    pub default_confidence: f64,
    pub star_bands: StarBands,
    pub grade_bands: GradeBands,
    pub keywords: PillarKeywords,
    pub tolerances: Tolerances,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pillar_weights: PillarWeights::default(),
            decay_days: 180.0,
            default_confidence: 0.5,
            star_bands: StarBands::default(),
            grade_bands: GradeBands::default(),
            keywords: PillarKeywords::default(),
            tolerances: Tolerances::default(),
        }
    }
}

impl ScoringConfig {
    /// Parses a JSON document; absent fields keep their defaults. The result
    /// is validated before it is returned.
    pub fn from_json_str(raw: &str) -> Result<Self, ScoringError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        self.pillar_weights.validate()?;
        if !self.decay_days.is_finite() || self.decay_days <= 0.0 {
            return Err(ScoringError::InvalidDecay(self.decay_days));
        }
        if !self.default_confidence.is_finite()
            || self.default_confidence <= 0.0
            || self.default_confidence > 1.0
        {
            return Err(ScoringError::InvalidConfidence(self.default_confidence));
        }
        self.star_bands.validate()?;
        self.grade_bands.validate()?;

        let t = &self.tolerances;
        for (name, value) in [
            ("overall_points", t.overall_points),
            ("endorsement_rate_points", t.endorsement_rate_points),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoringError::InvalidTolerance(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}
