//! Rubric Builder — turns the sanitized rubric response into a validated [`Rubric`].
//!
//! Expected shape:
//! `{"criteria": [{"name": str, "weight": num, "description": str, "is_required": bool}, ...]}`

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::MatchError;
use crate::models::{Criterion, Rubric};
use crate::scoring::{coerce_f64, describe_keys};

/// Untrusted criterion as emitted by the generator. Nothing leaves this module
/// until [`RawCriterion::validate`] has checked it.
#[derive(Debug, Deserialize)]
struct RawCriterion {
    name: Option<String>,
    weight: Option<Value>,
    description: Option<String>,
    is_required: Option<bool>,
}

impl RawCriterion {
    fn validate(self, index: usize) -> Result<Criterion, MatchError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| MatchError::Schema(format!("criteria[{index}] is missing 'name'")))?;

        let raw_weight = self.weight.ok_or_else(|| {
            MatchError::Schema(format!("criteria[{index}] ('{name}') is missing 'weight'"))
        })?;
        let weight = coerce_f64(&raw_weight)
            .filter(|w| *w >= 0.0)
            .ok_or_else(|| {
                MatchError::Schema(format!(
                    "criteria[{index}] ('{name}') has non-numeric or negative weight {raw_weight}"
                ))
            })?;

        Ok(Criterion {
            name,
            weight,
            description: self.description.unwrap_or_default(),
            is_required: self.is_required.unwrap_or(true),
        })
    }
}

/// Builds a weight-normalized rubric from the parsed rubric response.
pub fn build_rubric(json: &Value) -> Result<Rubric, MatchError> {
    let entries = json
        .get("criteria")
        .ok_or_else(|| {
            MatchError::Schema(format!(
                "missing 'criteria' key in rubric response. Keys found: {}",
                describe_keys(json)
            ))
        })?
        .as_array()
        .ok_or_else(|| MatchError::Schema("'criteria' must be an array".to_string()))?;

    if entries.is_empty() {
        return Err(MatchError::Schema("'criteria' array is empty".to_string()));
    }

    let criteria = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let raw: RawCriterion = serde_json::from_value(entry.clone())
                .map_err(|e| MatchError::Schema(format!("criteria[{index}]: {e}")))?;
            raw.validate(index)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let raw_total: f64 = criteria.iter().map(|c| c.weight).sum();
    let rubric = Rubric::normalized(criteria)?;
    debug!(
        "Built rubric with {} criteria (raw weight total {raw_total:.2}, normalized to 100)",
        rubric.len()
    );

    Ok(rubric)
}
