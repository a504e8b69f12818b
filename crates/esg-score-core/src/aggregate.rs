use chrono::{DateTime, Utc};

use crate::claim::Claim;
use crate::config::ScoringConfig;

const MS_PER_DAY: f64 = 86_400_000.0;

/// `exp(-age_days / decay_days)`. Claims dated in the future weigh 1.
pub fn recency_weight(created_at: DateTime<Utc>, now: DateTime<Utc>, decay_days: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let age_days = (now - created_at).num_milliseconds().max(0) as f64 / MS_PER_DAY;
    (-age_days / decay_days).exp()
}

/// Confidence- and recency-weighted averaging over claims, evaluated at a
/// fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    decay_days: f64,
    default_confidence: f64,
    now: DateTime<Utc>,
}

impl Aggregator {
    pub const fn new(decay_days: f64, default_confidence: f64, now: DateTime<Utc>) -> Self {
        Self {
            decay_days,
            default_confidence,
            now,
        }
    }

    pub const fn from_config(config: &ScoringConfig, now: DateTime<Utc>) -> Self {
        Self::new(config.decay_days, config.default_confidence, now)
    }

    pub fn recency(&self, claim: &Claim) -> f64 {
        recency_weight(claim.created_at, self.now, self.decay_days)
    }

    pub fn confidence(&self, claim: &Claim) -> f64 {
        claim.effective_confidence(self.default_confidence)
    }

    /// `confidence × recency`.
    pub fn claim_weight(&self, claim: &Claim) -> f64 {
        self.confidence(claim) * self.recency(claim)
    }

    /// Claims that may take part in aggregation: effective confidence above 0.
    pub fn qualifies(&self, claim: &Claim) -> bool {
        self.confidence(claim) > 0.0
    }

    /// `Σ(score × weight) / Σ weight`, or 0 when there is no weight at all.
    pub fn weighted_score<'a, I>(&self, claims: I) -> f64
    where
        I: IntoIterator<Item = &'a Claim>,
    {
        weighted_mean(
            claims
                .into_iter()
                .map(|claim| (claim.effective_score(), self.claim_weight(claim))),
        )
    }

    /// Recency-weighted mean confidence. Confidence is the value being
    /// averaged, so only recency contributes to the weight.
    pub fn confidence_level<'a, I>(&self, claims: I) -> f64
    where
        I: IntoIterator<Item = &'a Claim>,
    {
        weighted_mean(
            claims
                .into_iter()
                .map(|claim| (self.confidence(claim), self.recency(claim))),
        )
        .clamp(0.0, 1.0)
    }
}

/// Values that all agree come back unchanged rather than through the
/// division, which can land one ulp off.
fn weighted_mean(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut numerator = 0.0_f64;
    let mut denominator = 0.0_f64;
    let mut common: Option<f64> = None;
    let mut uniform = true;

    for (value, weight) in
        pairs.filter(|(value, weight)| value.is_finite() && weight.is_finite() && *weight > 0.0)
    {
        numerator = value.mul_add(weight, numerator);
        denominator += weight;
        match common {
            None => common = Some(value),
            Some(first) => uniform &= first.total_cmp(&value).is_eq(),
        }
    }

    match common {
        Some(value) if uniform => value,
        _ if denominator > 0.0 => numerator / denominator,
        _ => 0.0,
    }
}
