use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use esg_score_core::{
    percentage, percentile, score_from_percentage, snap_percentage, Aggregator, Claim,
    Normalized, Pillar, PillarSelection, ScoringConfig, ScoringError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::check::{check_metrics, check_validation};
use crate::metrics::{
    Checked, EsgMetrics, Inconsistency, PillarScore, PillarScores, ValidationTotals,
};
use crate::validation::{aggregate_validation, validation_totals, ValidationMetrics};

/// Scorecard computation under one fixed, validated configuration.
///
/// The engine holds no mutable state; every call works only on the claims
/// and the instant it is given.
#[derive(Debug, Clone, Default)]
pub struct ScorecardEngine {
    config: ScoringConfig,
}

/// One subject's scorecard within a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectScorecard {
    pub subject: String,
    pub metrics: Checked<EsgMetrics>,
    pub validation: Checked<ValidationMetrics>,
}

impl ScorecardEngine {
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scorecard for `claims` as of `now`. `peers` holds the raw overall
    /// scores the result is ranked against.
    pub fn compute_metrics(
        &self,
        claims: &[Claim],
        peers: &[f64],
        now: DateTime<Utc>,
    ) -> Checked<EsgMetrics> {
        let refs: Vec<&Claim> = claims.iter().collect();
        let metrics = self.scorecard(&refs, validation_totals(&refs), peers, now);
        log_warnings("scorecard", &metrics.warnings);
        metrics
    }

    pub fn compute_validation_metrics(&self, claims: &[Claim]) -> Checked<ValidationMetrics> {
        let refs: Vec<&Claim> = claims.iter().collect();
        let validation = self.validation(&refs);
        log_warnings("validation", &validation.warnings);
        validation
    }

    /// Scorecards for every subject in `claims`, each ranked against the
    /// overall scores of all other subjects. Best first.
    pub fn compute_portfolio(&self, claims: &[Claim], now: DateTime<Utc>) -> Vec<SubjectScorecard> {
        let mut by_subject: BTreeMap<&str, Vec<&Claim>> = BTreeMap::new();
        for claim in claims {
            by_subject.entry(claim.subject.as_str()).or_default().push(claim);
        }

        let mut cards: Vec<SubjectScorecard> = by_subject
            .into_iter()
            .map(|(subject, refs)| {
                let validation = self.validation(&refs);
                let totals = ValidationTotals::from(&validation.value);
                let metrics = self.scorecard(&refs, totals, &[], now);
                SubjectScorecard {
                    subject: subject.to_string(),
                    metrics,
                    validation,
                }
            })
            .collect();

        let overall: Vec<f64> = cards.iter().map(|c| c.metrics.value.overall_score).collect();
        for (idx, card) in cards.iter_mut().enumerate() {
            let others: Vec<f64> = overall
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != idx)
                .map(|(_, score)| *score)
                .collect();
            card.metrics.value.percentile = percentile(card.metrics.value.overall_score, &others);
        }

        for card in &cards {
            log_warnings(&card.subject, &card.metrics.warnings);
            // Totals problems already appear among the scorecard warnings.
            let rest: Vec<Inconsistency> = card
                .validation
                .warnings
                .iter()
                .filter(|w| !card.metrics.warnings.contains(w))
                .cloned()
                .collect();
            log_warnings(&card.subject, &rest);
        }

        cards.sort_by(|a, b| {
            b.metrics
                .value
                .overall_score
                .total_cmp(&a.metrics.value.overall_score)
                .then_with(|| a.subject.cmp(&b.subject))
        });
        debug!(subjects = cards.len(), "portfolio computed");
        cards
    }

    fn scorecard(
        &self,
        claims: &[&Claim],
        validation: ValidationTotals,
        peers: &[f64],
        now: DateTime<Utc>,
    ) -> Checked<EsgMetrics> {
        let cfg = &self.config;
        let agg = Aggregator::from_config(cfg, now);

        let qualifying: Vec<&Claim> = claims.iter().copied().filter(|c| agg.qualifies(c)).collect();
        let excluded = claims.len() - qualifying.len();
        if excluded > 0 {
            debug!(excluded, "claims without confidence left out of aggregation");
        }

        let pillars = PillarScores {
            environmental: self.pillar_score(&agg, &qualifying, Pillar::Environmental),
            social: self.pillar_score(&agg, &qualifying, Pillar::Social),
            governance: self.pillar_score(&agg, &qualifying, Pillar::Governance),
        };

        // Left unclamped so an out-of-range sum reaches the check below.
        let overall_percentage =
            snap_percentage(cfg.pillar_weights.combine(|p| pillars.get(p).percentage));
        let overall_score = score_from_percentage(overall_percentage);
        let normalized =
            Normalized::from_percentage(overall_percentage, &cfg.star_bands, &cfg.grade_bands);

        let metrics = EsgMetrics {
            overall_score,
            overall_percentage,
            overall_stars: normalized.stars,
            grade: normalized.grade,
            pillars,
            confidence: agg.confidence_level(qualifying.iter().copied()),
            percentile: percentile(overall_score, peers),
            claim_count: qualifying.len(),
            validation,
            computed_at: now,
        };

        let warnings = check_metrics(&metrics, &cfg.pillar_weights, &cfg.tolerances);
        debug!(
            claims = metrics.claim_count,
            overall = metrics.overall_percentage,
            grade = %metrics.grade,
            "scorecard computed"
        );
        Checked::new(metrics, warnings)
    }

    fn pillar_score(&self, agg: &Aggregator, claims: &[&Claim], pillar: Pillar) -> PillarScore {
        let selection = self.config.keywords.select(claims, pillar);
        match &selection {
            PillarSelection::Empty => {
                debug!(%pillar, "no claims for pillar");
                return PillarScore::empty(pillar);
            }
            PillarSelection::Fallback(general) => {
                debug!(%pillar, claims = general.len(), "pillar backed by general claims");
            }
            PillarSelection::Tagged(_) => {}
        }

        let score = agg.weighted_score(selection.claims().iter().copied());
        PillarScore {
            pillar,
            score,
            percentage: percentage(score),
            claim_count: selection.claims().len(),
            source: selection.source(),
        }
    }

    fn validation(&self, claims: &[&Claim]) -> Checked<ValidationMetrics> {
        let metrics = aggregate_validation(claims);
        let warnings = check_validation(&metrics, &self.config.tolerances);
        Checked::new(metrics, warnings)
    }
}

fn log_warnings(scope: &str, warnings: &[Inconsistency]) {
    for w in warnings {
        warn!(scope, kind = ?w.kind, field = %w.field, "{}", w.message);
    }
}

/// [`ScorecardEngine::compute_metrics`] under the default configuration with
/// no peer population.
pub fn compute_metrics(claims: &[Claim], now: DateTime<Utc>) -> Checked<EsgMetrics> {
    ScorecardEngine::default().compute_metrics(claims, &[], now)
}

/// [`ScorecardEngine::compute_validation_metrics`] under the default
/// configuration.
pub fn compute_validation_metrics(claims: &[Claim]) -> Checked<ValidationMetrics> {
    ScorecardEngine::default().compute_validation_metrics(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use esg_score_core::{Grade, PillarSource, PillarWeights, Tolerances, Validator};

    use crate::metrics::InconsistencyKind;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
    }

    fn claim(id: &str, subject: &str, label: &str, score: f64, confidence: f64) -> Claim {
        Claim::new(id, subject, label, now())
            .with_score(score)
            .with_confidence(confidence)
    }

    #[test]
    fn single_pillar_claim() {
        let claims = vec![claim("c1", "acme", "Carbon emissions", 0.2, 0.8)];
        let out = compute_metrics(&claims, now());
        assert!(out.is_consistent(), "{:?}", out.warnings);

        let m = out.value;
        assert!((m.pillars.environmental.percentage - 60.0).abs() < 1e-9);
        assert_eq!(m.pillars.social.percentage, 0.0);
        assert_eq!(m.pillars.governance.source, PillarSource::Empty);
        assert!((m.overall_percentage - 24.0).abs() < 1e-9);
        assert!((m.overall_score + 0.52).abs() < 1e-9);
        assert_eq!(m.overall_stars, 1);
        assert_eq!(m.grade, Grade::F);
        assert!((m.confidence - 0.8).abs() < 1e-12);
        assert_eq!(m.percentile, 50.0);
        assert_eq!(m.claim_count, 1);
        assert_eq!(m.computed_at, now());
    }

    #[test]
    fn empty_claims_give_zero_scorecard() {
        let out = compute_metrics(&[], now());
        assert!(out.is_consistent());
        let m = out.value;
        assert_eq!(m.overall_percentage, 0.0);
        assert_eq!(m.overall_score, -1.0);
        assert_eq!(m.confidence, 0.0);
        assert_eq!(m.validation.total_ratings, 0);
        assert!(m.pillars.iter().all(|p| p.source == PillarSource::Empty));
    }

    #[test]
    fn exact_pillars_combine_exactly() {
        let claims = vec![
            claim("e", "acme", "Climate", 1.0, 1.0),
            claim("s", "acme", "Labor rights", 0.0, 1.0),
            claim("g", "acme", "Board oversight", -1.0, 1.0),
        ];
        let m = compute_metrics(&claims, now()).value;
        assert_eq!(m.pillars.environmental.percentage, 100.0);
        assert_eq!(m.pillars.social.percentage, 50.0);
        assert_eq!(m.pillars.governance.percentage, 0.0);
        assert!((m.overall_percentage - 55.0).abs() < 1e-9);
        assert_eq!(m.overall_stars, 2);
    }

    #[test]
    fn general_claims_fill_missing_pillars() {
        let claims = vec![
            claim("e", "acme", "Renewable energy", 0.6, 1.0),
            claim("o", "acme", "Overall assessment", -0.2, 1.0),
        ];
        let m = compute_metrics(&claims, now()).value;
        assert_eq!(m.pillars.environmental.source, PillarSource::Tagged);
        assert_eq!(m.pillars.social.source, PillarSource::Fallback);
        assert!((m.pillars.social.percentage - 40.0).abs() < 1e-9);
        assert!((m.pillars.governance.percentage - 40.0).abs() < 1e-9);
    }

    #[test]
    fn zero_confidence_claims_are_left_out() {
        let claims = vec![
            claim("a", "acme", "Climate", 0.8, 1.0),
            claim("b", "acme", "Climate", -1.0, 0.0),
        ];
        let m = compute_metrics(&claims, now()).value;
        assert_eq!(m.claim_count, 1);
        assert!((m.pillars.environmental.score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn peers_drive_percentile() {
        let engine = ScorecardEngine::default();
        let claims = vec![claim("a", "acme", "ESG rating", 0.5, 1.0)];
        let m = engine.compute_metrics(&claims, &[-0.9, 0.2, 0.9, 1.0], now()).value;
        // overall 75% -> raw 0.5; two of four peers sit below it.
        assert!((m.overall_score - 0.5).abs() < 1e-9);
        assert_eq!(m.percentile, 50.0);
        assert_eq!(m.overall_stars, 4);
    }

    #[test]
    fn alternate_weights_are_honoured() {
        let config = ScoringConfig {
            pillar_weights: PillarWeights {
                environmental: 0.0,
                social: 0.0,
                governance: 1.0,
            },
            ..ScoringConfig::default()
        };
        let engine = ScorecardEngine::new(config).expect("valid config");
        let claims = vec![
            claim("e", "acme", "Climate", 1.0, 1.0),
            claim("g", "acme", "Audit quality", 0.8, 1.0),
        ];
        let m = engine.compute_metrics(&claims, &[], now()).value;
        assert!((m.overall_percentage - 90.0).abs() < 1e-9);
        assert_eq!(m.overall_stars, 5);
        assert_eq!(m.grade, Grade::AMinus);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScoringConfig {
            decay_days: -3.0,
            ..ScoringConfig::default()
        };
        assert!(matches!(
            ScorecardEngine::new(config),
            Err(ScoringError::InvalidDecay(_))
        ));
    }

    #[test]
    fn results_depend_on_the_supplied_instant() {
        let claims = vec![
            Claim::new("old", "acme", "Climate", now() - Duration::days(400))
                .with_score(-1.0)
                .with_confidence(1.0),
            claim("new", "acme", "Climate", 1.0, 1.0),
        ];
        let current = compute_metrics(&claims, now()).value;
        let earlier = compute_metrics(&claims, now() - Duration::days(200)).value;
        // Seen from 200 days back the newer claim is future-dated and capped
        // at weight 1, so the older claim counts for more.
        assert!(earlier.pillars.environmental.score < current.pillars.environmental.score);
        assert_eq!(compute_metrics(&claims, now()).value, current);
    }

    #[test]
    fn scorecard_embeds_validation_totals() {
        let claims = vec![claim("a", "acme", "Climate", 0.1, 0.9)
            .with_stars(5.0)
            .with_validator(Validator::new("Ana", 3.0))
            .with_validator(Validator::new("Ben", 1.0).verified(true))];
        let m = compute_metrics(&claims, now()).value;
        assert_eq!(m.validation.total_ratings, 3);
        assert_eq!(m.validation.endorsements, 1);
        assert_eq!(m.validation.rejections, 1);

        let v = compute_validation_metrics(&claims);
        assert!(v.is_consistent(), "{:?}", v.warnings);
        assert_eq!(v.value.verified_rate, 50.0);
        assert_eq!(v.value.history.len(), 3);
    }

    #[test]
    fn identical_general_claims_land_on_band_edges() {
        let cases = [
            (0.8, 90.0, 5, Grade::AMinus),
            (0.94, 97.0, 5, Grade::APlus),
            (0.5, 75.0, 4, Grade::C),
            (0.2, 60.0, 3, Grade::D),
            (-0.2, 40.0, 2, Grade::F),
        ];
        for (score, pct, stars, grade) in cases {
            for n in 1..40 {
                let claims: Vec<Claim> = (0..n)
                    .map(|i| claim(&format!("c{i}"), "acme", "Overall ESG rating", score, 1.0))
                    .collect();
                let out = compute_metrics(&claims, now());
                assert!(out.is_consistent(), "{:?}", out.warnings);
                let m = out.value;
                assert_eq!(m.pillars.environmental.score, score, "{n} claims at {score}");
                assert_eq!(m.overall_percentage, pct, "{n} claims at {score}");
                assert_eq!(m.overall_stars, stars, "{n} claims at {score}");
                assert_eq!(m.grade, grade, "{n} claims at {score}");
            }
        }
    }

    #[test]
    fn validation_warnings_reach_the_caller() {
        // Built directly: a negative tolerance never passes config validation.
        let engine = ScorecardEngine {
            config: ScoringConfig {
                tolerances: Tolerances {
                    overall_points: 0.5,
                    endorsement_rate_points: -1.0,
                },
                ..ScoringConfig::default()
            },
        };
        let claims = vec![claim("a", "acme", "Climate", 0.1, 0.9).with_stars(5.0)];

        let v = engine.compute_validation_metrics(&claims);
        assert_eq!(v.value.total_ratings, 1);
        assert_eq!(
            v.warnings.iter().map(|w| w.kind).collect::<Vec<_>>(),
            vec![InconsistencyKind::EndorsementRateMismatch]
        );

        let cards = engine.compute_portfolio(&claims, now());
        assert_eq!(cards[0].validation, v);
        // The scorecard reports the same totals problem exactly once.
        let in_metrics = cards[0]
            .metrics
            .warnings
            .iter()
            .filter(|w| w.kind == InconsistencyKind::EndorsementRateMismatch)
            .count();
        assert_eq!(in_metrics, 1);
    }

    #[test]
    fn overall_sum_out_of_range_is_reported_not_hidden() {
        let engine = ScorecardEngine {
            config: ScoringConfig {
                pillar_weights: PillarWeights {
                    environmental: 0.8,
                    social: 0.8,
                    governance: 0.8,
                },
                ..ScoringConfig::default()
            },
        };
        let claims = vec![claim("o", "acme", "Overall rating", 1.0, 1.0)];
        let out = engine.compute_metrics(&claims, &[], now());
        assert_eq!(out.value.overall_percentage, 240.0);
        assert_eq!(out.value.overall_stars, 5);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.kind == InconsistencyKind::OutOfRange && w.field == "overall_percentage"));
    }

    #[test]
    fn portfolio_ranks_subjects_against_each_other() {
        let claims = vec![
            claim("a1", "acme", "Climate", 0.9, 1.0),
            claim("b1", "borealis", "Climate", 0.1, 1.0),
            claim("c1", "cobalt", "Climate", -0.5, 1.0),
            claim("a2", "acme", "Board", 0.7, 1.0),
        ];
        let engine = ScorecardEngine::default();
        let cards = engine.compute_portfolio(&claims, now());
        let order: Vec<&str> = cards.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(order, vec!["acme", "borealis", "cobalt"]);
        assert_eq!(cards[0].metrics.value.percentile, 100.0);
        assert_eq!(cards[1].metrics.value.percentile, 50.0);
        assert_eq!(cards[2].metrics.value.percentile, 0.0);
        assert_eq!(cards[0].metrics.value.claim_count, 2);
        assert!(cards.iter().all(|c| c.validation.is_consistent()));
    }
}
