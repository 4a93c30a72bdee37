use serde::{Deserialize, Serialize};

/// One candidate's evaluation against one named criterion.
///
/// `criteria_name` is whatever the scoring pass emitted until the score builder
/// rewrites it to the canonical rubric name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criteria_name: String,
    /// Expected 0–100. Out-of-range values are carried through unchanged.
    pub score: f64,
    pub evidence: String,
    /// Advisory: should be populated whenever `score` < 80.
    pub gap: String,
}

impl CriterionScore {
    pub fn new(criteria_name: impl Into<String>, score: f64) -> Self {
        Self {
            criteria_name: criteria_name.into(),
            score,
            evidence: String::new(),
            gap: String::new(),
        }
    }
}

/// One row of the aggregation breakdown. Carries every field a renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownItem {
    pub criterion: String,
    pub score: f64,
    pub weight: f64,
    /// `score * weight / 100`, rounded to 2 decimals.
    pub contribution: f64,
    pub evidence: String,
    pub gap: String,
}

/// Aggregation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// 0–100 whenever the per-criterion scores are in range.
    pub final_score: i64,
    pub total_weight_used: f64,
    pub breakdown: Vec<BreakdownItem>,
    /// Raw names of score entries that matched no criterion and were left out.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

impl EvaluationResult {
    pub fn fit_band(&self) -> FitBand {
        FitBand::from_score(self.final_score)
    }

    /// True when some rubric weight went unscored.
    pub fn is_partial(&self) -> bool {
        self.total_weight_used < 100.0 - 1e-6
    }
}

/// Coarse reading of a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitBand {
    Strong,
    Moderate,
    Low,
}

impl FitBand {
    pub fn from_score(score: i64) -> Self {
        if score >= 80 {
            FitBand::Strong
        } else if score >= 60 {
            FitBand::Moderate
        } else {
            FitBand::Low
        }
    }
}
