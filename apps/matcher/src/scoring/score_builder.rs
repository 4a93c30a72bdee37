//! Score Builder — turns the sanitized scoring response into [`CriterionScore`]s with
//! canonical criterion names.
//!
//! Expected shape:
//! `{"criteria_scores": [{"criteria_name": str, "score": num, "evidence": str, "gap": str}, ...]}`
//! A bare top-level array of entries is accepted as well.
//!
//! Entries without a usable `criteria_name` or `score` are skipped with a warning so one bad
//! entry does not sink the whole evaluation. Scores are not clamped.

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::MatchError;
use crate::models::{CriterionScore, Rubric};
use crate::scoring::resolver::{resolve, Resolution};
use crate::scoring::{coerce_f64, describe_keys};

const SCORES_KEY: &str = "criteria_scores";

/// Builds the score list for `rubric` from the parsed scoring response.
pub fn build_scores(json: &Value, rubric: &Rubric) -> Result<Vec<CriterionScore>, MatchError> {
    let entries = score_entries(json)?;

    let mut scores = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(mut score) = parse_entry(index, entry) else {
            continue;
        };

        match resolve(rubric, &score.criteria_name) {
            Resolution::Exact(_) => {}
            resolution @ (Resolution::Annotated(canonical) | Resolution::Substring(canonical)) => {
                debug!(
                    "Normalized criteria name: '{}' -> '{}' ({:?})",
                    score.criteria_name, canonical, resolution
                );
                score.criteria_name = canonical.to_string();
            }
            Resolution::Unmatched => {
                warn!(
                    "Score entry '{}' matches no rubric criterion; it will not contribute weight",
                    score.criteria_name
                );
            }
        }

        if score.evidence.is_empty() && score.gap.is_empty() {
            warn!("No evidence or gap for criterion '{}'", score.criteria_name);
        }

        scores.push(score);
    }

    debug!(
        "Built {} criterion scores ({} with evidence, {} with gap)",
        scores.len(),
        scores.iter().filter(|s| !s.evidence.is_empty()).count(),
        scores.iter().filter(|s| !s.gap.is_empty()).count()
    );

    Ok(scores)
}

/// Accepts `{"criteria_scores": [...]}` or a bare array. The sanitizer only lets objects
/// through, so the bare array is reachable from direct callers only.
fn score_entries(json: &Value) -> Result<&Vec<Value>, MatchError> {
    if let Some(entries) = json.as_array() {
        return Ok(entries);
    }

    json.get(SCORES_KEY)
        .ok_or_else(|| {
            MatchError::Schema(format!(
                "missing '{SCORES_KEY}' key in scoring response. Keys found: {}",
                describe_keys(json)
            ))
        })?
        .as_array()
        .ok_or_else(|| MatchError::Schema(format!("'{SCORES_KEY}' must be an array")))
}

fn parse_entry(index: usize, entry: &Value) -> Option<CriterionScore> {
    let Some(name) = entry.get("criteria_name").and_then(Value::as_str) else {
        warn!("Skipping score entry {index}: missing 'criteria_name' in {entry}");
        return None;
    };

    let Some(score) = entry.get("score").and_then(coerce_f64) else {
        warn!("Skipping score entry {index} ('{name}'): missing or non-numeric 'score'");
        return None;
    };

    Some(CriterionScore {
        criteria_name: name.to_string(),
        score,
        evidence: text_field(entry, "evidence"),
        gap: text_field(entry, "gap"),
    })
}

/// Absent, null or non-string text fields all become "".
fn text_field(entry: &Value, key: &str) -> String {
    entry
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
