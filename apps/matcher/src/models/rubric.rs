use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::MatchError;
use crate::scoring::resolver::WEIGHT_ANNOTATION_MARKER;

/// A named, weighted evaluation dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    /// Percentage share of the rubric. Sums to 100 across a built rubric.
    pub weight: f64,
    /// Carries the required proficiency / seniority level when one applies.
    pub description: String,
    /// true = blocking requirement, false = preferred.
    pub is_required: bool,
}

/// Ordered, weight-normalized set of criteria for one job posting.
///
/// Built through [`Rubric::normalized`]. Deserialization re-checks the same invariants
/// (non-empty, unique names, strictly positive weights, weights summing to 100), so a
/// rubric read back from the cache is held to them too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredRubric")]
pub struct Rubric {
    criteria: Vec<Criterion>,
    total_weight: f64,
}

/// Slack allowed on the weight sum of a stored rubric.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl Rubric {
    pub const TOTAL_WEIGHT: f64 = 100.0;

    /// Validates `criteria` and rescales the weights so they sum to exactly 100.
    ///
    /// The generator is not trusted to emit weights that add up, so the raw values are only
    /// read as relative importance. Zero-weight criteria can never contribute and are dropped.
    pub fn normalized(criteria: Vec<Criterion>) -> Result<Self, MatchError> {
        check_criteria(&criteria)?;

        let (mut kept, dropped): (Vec<Criterion>, Vec<Criterion>) =
            criteria.into_iter().partition(|c| c.weight > 0.0);
        for criterion in &dropped {
            warn!("Dropping zero-weight criterion '{}'", criterion.name);
        }

        let raw_total: f64 = kept.iter().map(|c| c.weight).sum();
        if kept.is_empty() || raw_total <= 0.0 {
            return Err(MatchError::Schema(
                "criteria weights sum to zero".to_string(),
            ));
        }

        for criterion in &mut kept {
            criterion.weight = criterion.weight / raw_total * Self::TOTAL_WEIGHT;
        }

        Ok(Rubric {
            criteria: kept,
            total_weight: Self::TOTAL_WEIGHT,
        })
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Exact, case-sensitive lookup by canonical name.
    pub fn get(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.name == name)
    }

    /// One line per criterion, `- {name} (Weight: {w:.1}%): {description}`.
    /// This is the form the scoring prompt shows the generator.
    pub fn summary(&self) -> String {
        self.criteria
            .iter()
            .map(|c| {
                format!(
                    "- {} {} {:.1}%): {}",
                    c.name, WEIGHT_ANNOTATION_MARKER, c.weight, c.description
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn check_criteria(criteria: &[Criterion]) -> Result<(), MatchError> {
    if criteria.is_empty() {
        return Err(MatchError::Schema("rubric has no criteria".to_string()));
    }

    let mut seen = HashSet::new();
    for criterion in criteria {
        if criterion.name.trim().is_empty() {
            return Err(MatchError::Schema("criterion name is empty".to_string()));
        }
        if !criterion.weight.is_finite() || criterion.weight < 0.0 {
            return Err(MatchError::Schema(format!(
                "criterion '{}' has invalid weight {}",
                criterion.name, criterion.weight
            )));
        }
        if !seen.insert(criterion.name.as_str()) {
            return Err(MatchError::Schema(format!(
                "duplicate criterion name '{}'",
                criterion.name
            )));
        }
    }
    Ok(())
}

/// Serialized form of a [`Rubric`]. Weights are taken as stored, not rescaled, so a
/// record must already be normalized to be accepted.
#[derive(Deserialize)]
struct StoredRubric {
    criteria: Vec<Criterion>,
}

impl TryFrom<StoredRubric> for Rubric {
    type Error = MatchError;

    fn try_from(stored: StoredRubric) -> Result<Self, Self::Error> {
        check_criteria(&stored.criteria)?;

        if let Some(c) = stored.criteria.iter().find(|c| c.weight <= 0.0) {
            return Err(MatchError::Schema(format!(
                "stored criterion '{}' has non-positive weight",
                c.name
            )));
        }
        let total: f64 = stored.criteria.iter().map(|c| c.weight).sum();
        if (total - Self::TOTAL_WEIGHT).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchError::Schema(format!(
                "stored weights sum to {total}, expected {}",
                Self::TOTAL_WEIGHT
            )));
        }

        Ok(Rubric {
            criteria: stored.criteria,
            total_weight: Self::TOTAL_WEIGHT,
        })
    }
}
