pub mod evaluation;
pub mod rubric;

pub use evaluation::{BreakdownItem, CriterionScore, EvaluationResult, FitBand};
pub use rubric::{Criterion, Rubric};
