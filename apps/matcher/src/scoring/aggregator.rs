//! Weighted Aggregator — folds a rubric and its criterion scores into one 0–100 score.
//!
//! Algorithm:
//! 1. For each score entry, resolve its name against the rubric (a no-op for names the
//!    score builder already canonicalized).
//! 2. Matched entries contribute `score × weight / 100` and add their weight to
//!    `total_weight_used`. Unmatched entries are left out of the breakdown and the sum.
//! 3. `final_score = round(Σ contribution)`. This is NOT divided by `total_weight_used`:
//!    criteria the scoring pass skipped pull the score down instead of being backfilled.
//! 4. If nothing matched, fall back to the unweighted mean of all supplied scores.
//!    With no scores either there is nothing to evaluate: `MatchError::EmptyInput`.
//!
//! Rounding is half-to-even, so a 72.5 lands on 72.

use tracing::{debug, warn};

use crate::errors::MatchError;
use crate::models::{BreakdownItem, CriterionScore, EvaluationResult, Rubric};
use crate::scoring::resolver::resolve;

/// Aggregates `scores` against `rubric`. Partial coverage is a valid, lower score.
pub fn aggregate(
    rubric: &Rubric,
    scores: &[CriterionScore],
) -> Result<EvaluationResult, MatchError> {
    let mut weighted_sum = 0.0_f64;
    let mut total_weight_used = 0.0_f64;
    let mut breakdown = Vec::with_capacity(scores.len());
    let mut unmatched = Vec::new();

    for entry in scores {
        let matched = resolve(rubric, &entry.criteria_name)
            .canonical()
            .and_then(|name| rubric.get(name))
            .filter(|criterion| criterion.weight > 0.0);

        let Some(criterion) = matched else {
            warn!(
                "Could not match criterion '{}'; excluding it from the breakdown",
                entry.criteria_name
            );
            unmatched.push(entry.criteria_name.clone());
            continue;
        };

        let contribution = entry.score * (criterion.weight / 100.0);
        weighted_sum += contribution;
        total_weight_used += criterion.weight;

        breakdown.push(BreakdownItem {
            criterion: criterion.name.clone(),
            score: entry.score,
            weight: criterion.weight,
            contribution: round_to_cents(contribution),
            evidence: entry.evidence.clone(),
            gap: entry.gap.clone(),
        });
    }

    let final_score = if total_weight_used > 0.0 {
        weighted_sum.round_ties_even() as i64
    } else if scores.is_empty() {
        return Err(MatchError::EmptyInput);
    } else {
        warn!(
            "No score entry matched the rubric; falling back to the unweighted mean of {} scores",
            scores.len()
        );
        let mean = scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64;
        mean.round_ties_even() as i64
    };

    debug!(
        "Aggregated {} entries: final_score={final_score}, total_weight_used={total_weight_used:.1}, unmatched={}",
        scores.len(),
        unmatched.len()
    );

    Ok(EvaluationResult {
        final_score,
        total_weight_used,
        breakdown,
        unmatched,
    })
}

/// Two decimals, ties to even like the final score.
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
