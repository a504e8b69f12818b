use esg_score_core::{PillarWeights, Tolerances};

use crate::metrics::{EsgMetrics, Inconsistency, InconsistencyKind, ValidationTotals};
use crate::validation::ValidationMetrics;

/// Checks a composed scorecard against its invariants. Problems are reported,
/// never repaired.
pub fn check_metrics(
    metrics: &EsgMetrics,
    weights: &PillarWeights,
    tolerances: &Tolerances,
) -> Vec<Inconsistency> {
    let mut out = Vec::new();

    in_range(&mut out, "overall_score", metrics.overall_score, -1.0, 1.0);
    in_range(&mut out, "overall_percentage", metrics.overall_percentage, 0.0, 100.0);
    in_range(&mut out, "overall_stars", f64::from(metrics.overall_stars), 0.0, 5.0);
    in_range(&mut out, "confidence", metrics.confidence, 0.0, 1.0);
    in_range(&mut out, "percentile", metrics.percentile, 0.0, 100.0);

    for pillar in metrics.pillars.iter() {
        let label = pillar.pillar.label();
        in_range(&mut out, &format!("pillars.{label}.score"), pillar.score, -1.0, 1.0);
        in_range(
            &mut out,
            &format!("pillars.{label}.percentage"),
            pillar.percentage,
            0.0,
            100.0,
        );
    }

    let expected = weights.combine(|p| metrics.pillars.get(p).percentage);
    let drift = (metrics.overall_percentage - expected).abs();
    if expected.is_finite() && drift > tolerances.overall_points {
        out.push(Inconsistency::new(
            InconsistencyKind::OverallMismatch,
            "overall_percentage",
            format!(
                "overall percentage {:.2} differs from weighted pillar sum {expected:.2} \
                 by {drift:.2} points",
                metrics.overall_percentage
            ),
        ));
    }

    check_totals(&mut out, &metrics.validation, tolerances);
    out
}

/// Range checks for a standalone validation result.
pub fn check_validation(
    metrics: &ValidationMetrics,
    tolerances: &Tolerances,
) -> Vec<Inconsistency> {
    let mut out = Vec::new();
    check_totals(&mut out, &ValidationTotals::from(metrics), tolerances);
    in_range(&mut out, "average_rating", metrics.average_rating, 0.0, 5.0);
    in_range(&mut out, "consensus", metrics.consensus, 0.0, 100.0);
    in_range(&mut out, "verified_rate", metrics.verified_rate, 0.0, 100.0);
    if metrics.verified_count > metrics.validator_count {
        out.push(Inconsistency::new(
            InconsistencyKind::BucketOverflow,
            "verified_count",
            format!(
                "{} verified validators out of {}",
                metrics.verified_count, metrics.validator_count
            ),
        ));
    }
    out
}

fn check_totals(out: &mut Vec<Inconsistency>, totals: &ValidationTotals, tolerances: &Tolerances) {
    in_range(out, "validation.endorsement_rate", totals.endorsement_rate, 0.0, 100.0);

    if totals.endorsements + totals.rejections > totals.total_ratings {
        out.push(Inconsistency::new(
            InconsistencyKind::BucketOverflow,
            "validation",
            format!(
                "endorsements ({}) + rejections ({}) exceed total ratings ({})",
                totals.endorsements, totals.rejections, totals.total_ratings
            ),
        ));
    }

    if totals.total_ratings > 0 && totals.endorsement_rate.is_finite() {
        #[allow(clippy::cast_precision_loss)]
        let expected = totals.endorsements as f64 / totals.total_ratings as f64 * 100.0;
        let drift = (totals.endorsement_rate - expected).abs();
        if drift > tolerances.endorsement_rate_points {
            out.push(Inconsistency::new(
                InconsistencyKind::EndorsementRateMismatch,
                "validation.endorsement_rate",
                format!(
                    "endorsement rate {:.2} does not match {}/{} ratings ({expected:.2})",
                    totals.endorsement_rate, totals.endorsements, totals.total_ratings
                ),
            ));
        }
    }
}

fn in_range(out: &mut Vec<Inconsistency>, field: &str, value: f64, min: f64, max: f64) {
    if !value.is_finite() {
        out.push(Inconsistency::new(
            InconsistencyKind::NotFinite,
            field,
            format!("{field} is not a finite number"),
        ));
    } else if value < min || value > max {
        out.push(Inconsistency::new(
            InconsistencyKind::OutOfRange,
            field,
            format!("{field} = {value} is outside [{min}, {max}]"),
        ));
    }
}
