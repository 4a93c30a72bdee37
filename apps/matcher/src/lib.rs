//! Candidate/job matching engine.
//!
//! Turns a job posting into a weight-normalized rubric, scores a candidate against each
//! criterion, and folds the scores into one 0–100 result with a per-criterion breakdown.
//! Rubric and score content come from an external text generator; this crate owns the
//! parsing, name reconciliation, aggregation and rubric caching around it.

pub mod cache;
pub mod config;
pub mod errors;
pub mod evaluation;
pub mod llm_client;
pub mod models;
pub mod scoring;
pub mod telemetry;

pub use cache::{cache_key, RubricCache};
pub use config::Config;
pub use errors::MatchError;
pub use evaluation::Evaluator;
pub use models::{BreakdownItem, Criterion, CriterionScore, EvaluationResult, FitBand, Rubric};
pub use scoring::{aggregate, build_rubric, build_scores, extract_json, resolve, Resolution};
