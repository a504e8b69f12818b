use chrono::{DateTime, Utc};
use esg_score_core::{Claim, Validator};
use serde::{Deserialize, Serialize};

use crate::metrics::ValidationTotals;

const ENDORSEMENT_MIN: f64 = 4.0;
const REJECTION_MAX: f64 = 2.0;
const CONSENSUS_SPREAD: f64 = 1.0;
const UNKNOWN_CURATOR: &str = "Unknown curator";
const CURATOR_ROLE: &str = "Curator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    /// The claim's own star rating, attributed to whoever issued the claim.
    Curator,
    /// A validator sub-record attached to the claim.
    Validator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationEntry {
    pub claim_id: String,
    pub origin: EntryOrigin,
    pub validator: String,
    pub role: String,
    pub organization: String,
    pub rating: f64,
    pub statement: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub total_ratings: usize,
    pub endorsements: usize,
    pub rejections: usize,
    pub average_rating: f64,
    pub endorsement_rate: f64,
    pub consensus: f64,
    /// Share of validator sub-records marked verified. Reads 100 when there
    /// are no validator sub-records; check `validator_count` to tell that
    /// case apart.
    pub verified_rate: f64,
    pub validator_count: usize,
    pub verified_count: usize,
    /// Newest first.
    pub history: Vec<ValidationEntry>,
}

impl Default for ValidationMetrics {
    fn default() -> Self {
        Self {
            total_ratings: 0,
            endorsements: 0,
            rejections: 0,
            average_rating: 0.0,
            endorsement_rate: 0.0,
            consensus: 0.0,
            verified_rate: 100.0,
            validator_count: 0,
            verified_count: 0,
            history: Vec::new(),
        }
    }
}

pub fn is_endorsement(rating: f64) -> bool {
    rating >= ENDORSEMENT_MIN
}

pub fn is_rejection(rating: f64) -> bool {
    rating <= REJECTION_MAX
}

/// Rating statistics across every rating-bearing record of `claims`: each
/// claim's own stars and each validator's rating, zeros excluded.
pub fn aggregate_validation(claims: &[&Claim]) -> ValidationMetrics {
    let mut ratings = Vec::new();
    let mut history = Vec::new();
    let mut validator_count = 0_usize;
    let mut verified_count = 0_usize;

    for claim in claims {
        if let Some(rating) = claim.own_rating() {
            ratings.push(rating);
            history.push(ValidationEntry {
                claim_id: claim.id.clone(),
                origin: EntryOrigin::Curator,
                validator: curator_name(claim),
                role: CURATOR_ROLE.to_string(),
                organization: claim.source.clone().unwrap_or_default(),
                rating,
                statement: claim.statement.clone(),
                verified: false,
                created_at: claim.created_at,
            });
        }

        for validator in &claim.validators {
            validator_count += 1;
            verified_count += usize::from(validator.verified);

            let Some(rating) = validator.counted_rating() else {
                continue;
            };
            ratings.push(rating);
            history.push(ValidationEntry {
                claim_id: claim.id.clone(),
                origin: EntryOrigin::Validator,
                validator: validator.name.clone(),
                role: validator.role.clone(),
                organization: validator.organization.clone(),
                rating,
                statement: validator.statement.clone(),
                verified: validator.verified,
                created_at: claim.created_at,
            });
        }
    }

    history.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let verified_rate = if validator_count == 0 {
        100.0
    } else {
        ratio_pct(verified_count, validator_count)
    };

    let stats = RatingStats::from_ratings(&ratings);
    ValidationMetrics {
        total_ratings: stats.total,
        endorsements: stats.endorsements,
        rejections: stats.rejections,
        average_rating: stats.average,
        endorsement_rate: stats.endorsement_rate(),
        consensus: stats.consensus,
        verified_rate,
        validator_count,
        verified_count,
        history,
    }
}

/// The rating counts of [`aggregate_validation`], without building the
/// history.
pub fn validation_totals(claims: &[&Claim]) -> ValidationTotals {
    let ratings: Vec<f64> = claims
        .iter()
        .flat_map(|claim| {
            claim
                .own_rating()
                .into_iter()
                .chain(claim.validators.iter().filter_map(Validator::counted_rating))
        })
        .collect();
    let stats = RatingStats::from_ratings(&ratings);
    ValidationTotals {
        total_ratings: stats.total,
        endorsements: stats.endorsements,
        rejections: stats.rejections,
        endorsement_rate: stats.endorsement_rate(),
    }
}

/// Counting core shared by the claim-level aggregation; usable on its own
/// for a bare rating population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingStats {
    pub total: usize,
    pub endorsements: usize,
    pub rejections: usize,
    pub average: f64,
    pub consensus: f64,
}

impl RatingStats {
    pub fn from_ratings(ratings: &[f64]) -> Self {
        let total = ratings.len();
        if total == 0 {
            return Self {
                total: 0,
                endorsements: 0,
                rejections: 0,
                average: 0.0,
                consensus: 0.0,
            };
        }

        let endorsements = ratings.iter().filter(|r| is_endorsement(**r)).count();
        let rejections = ratings.iter().filter(|r| is_rejection(**r)).count();
        #[allow(clippy::cast_precision_loss)]
        let average = ratings.iter().sum::<f64>() / total as f64;
        let agreeing = ratings
            .iter()
            .filter(|r| (**r - average).abs() <= CONSENSUS_SPREAD + 1e-9)
            .count();

        Self {
            total,
            endorsements,
            rejections,
            average,
            consensus: ratio_pct(agreeing, total),
        }
    }

    pub fn endorsement_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            ratio_pct(self.endorsements, self.total)
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio_pct(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64 * 100.0
}

fn curator_name(claim: &Claim) -> String {
    claim
        .author
        .as_deref()
        .or(claim.source.as_deref())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNKNOWN_CURATOR)
        .to_string()
}
