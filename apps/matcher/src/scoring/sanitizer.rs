//! Response Sanitizer — pulls one JSON object out of free-form generator output.
//!
//! Extraction runs as an ordered chain; the first strategy that yields a body wins:
//! 1. a ```` ```json ```` fenced block
//! 2. any ```` ``` ```` fenced block
//! 3. the whole (trimmed) text
//!
//! The body is then sliced from the first `{` to the last `}`. The slice is greedy:
//! an object with nested braces survives, but two sibling objects in one response
//! produce an unparseable slice and the call fails as `MalformedResponse`.

use serde_json::Value;

use crate::errors::MatchError;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

type FenceStrategy = fn(&str) -> Option<&str>;

const FENCE_STRATEGIES: &[FenceStrategy] = &[json_fenced_block, any_fenced_block];

/// Returns the JSON object substring of `text`, validated by a strict parse.
pub fn extract_json(text: &str) -> Result<&str, MatchError> {
    sanitize(text).map(|(json, _)| json)
}

/// Like [`extract_json`] but hands back the parsed value, for the builders.
pub fn parse_json_response(text: &str) -> Result<Value, MatchError> {
    sanitize(text).map(|(_, value)| value)
}

fn sanitize(text: &str) -> Result<(&str, Value), MatchError> {
    let trimmed = text.trim();

    let body = FENCE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(trimmed))
        .unwrap_or(trimmed);

    let candidate = slice_outer_braces(body).trim();

    if candidate.is_empty() {
        return Err(MatchError::malformed(
            "empty after extraction",
            None,
            candidate,
            text,
        ));
    }

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        MatchError::malformed(
            format!("JSON parsing failed at line {} column {}: {e}", e.line(), e.column()),
            Some((e.line(), e.column())),
            candidate,
            text,
        )
    })?;

    if !value.is_object() {
        return Err(MatchError::malformed(
            "expected a JSON object",
            None,
            candidate,
            text,
        ));
    }

    Ok((candidate, value))
}

fn json_fenced_block(text: &str) -> Option<&str> {
    fenced_after(text, JSON_FENCE)
}

fn any_fenced_block(text: &str) -> Option<&str> {
    fenced_after(text, FENCE)
}

/// Contents between the first `opener` and the next closing fence. Unclosed fences yield None.
fn fenced_after<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let end = start + text[start..].find(FENCE)?;
    Some(text[start..end].trim())
}

fn slice_outer_braces(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}
