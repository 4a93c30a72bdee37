// Orchestration of the full job posting → rubric → scores → result flow.
// All generator calls go through llm_client::TextGenerator.

pub mod pipeline;
pub mod prompts;

pub use pipeline::{CandidateEvaluation, CandidateOutcome, Evaluator, RubricOutcome, StepTimings};
