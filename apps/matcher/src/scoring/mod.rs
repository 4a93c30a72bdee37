//! Evaluation core: sanitize → build → resolve → aggregate.
//!
//! Everything in here is pure and synchronous. Generator calls and caching live in
//! `evaluation` and `cache`.

pub mod aggregator;
pub mod resolver;
pub mod rubric_builder;
pub mod sanitizer;
pub mod score_builder;

pub use aggregator::aggregate;
pub use resolver::{resolve, Resolution};
pub use rubric_builder::build_rubric;
pub use sanitizer::{extract_json, parse_json_response};
pub use score_builder::build_scores;

use serde_json::Value;

/// Reads a JSON number, or a string holding one, as a finite `f64`.
pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Keys of a JSON object, for schema diagnostics.
pub(crate) fn describe_keys(value: &Value) -> String {
    match value.as_object() {
        Some(map) => map.keys().cloned().collect::<Vec<_>>().join(", "),
        None => format!("<not an object: {}>", json_kind(value)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
