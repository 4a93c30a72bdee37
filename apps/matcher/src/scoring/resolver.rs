//! Criterion Name Resolver — maps a score entry's name onto a canonical rubric name.
//!
//! The rubric and the scores come from two independent generation passes, so the names
//! drift: a trailing `(Weight: 15.0%)`, different casing, a shortened label. The cascade
//! below trades precision for recall; first success wins:
//!
//! 1. exact match
//! 2. exact match after stripping the weight annotation
//! 3. case-insensitive containment of the raw name in either direction, first criterion
//!    in rubric order
//!
//! Step 3 is order-dependent on purpose: the first criterion in rubric order that contains
//! (or is contained by) the name is taken, with no ranking of match quality. Reordering the
//! rubric can change which criterion a vague name lands on.

use crate::models::Rubric;

/// Marker that opens the inline weight annotation the scoring prompt shows
/// next to each criterion name.
pub const WEIGHT_ANNOTATION_MARKER: &str = "(Weight:";

/// Outcome of resolving one raw name. Borrowed from the rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'r> {
    Exact(&'r str),
    /// Matched once the `(Weight: …)` suffix was removed.
    Annotated(&'r str),
    /// Matched by case-insensitive containment.
    Substring(&'r str),
    Unmatched,
}

impl<'r> Resolution<'r> {
    pub fn canonical(&self) -> Option<&'r str> {
        match *self {
            Resolution::Exact(name) | Resolution::Annotated(name) | Resolution::Substring(name) => {
                Some(name)
            }
            Resolution::Unmatched => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        !matches!(self, Resolution::Unmatched)
    }
}

/// Resolves `raw_name` against `rubric`.
pub fn resolve<'r>(rubric: &'r Rubric, raw_name: &str) -> Resolution<'r> {
    if let Some(c) = rubric.get(raw_name) {
        return Resolution::Exact(&c.name);
    }

    let stripped = strip_weight_annotation(raw_name);
    if let Some(name) = stripped {
        if let Some(c) = rubric.get(name) {
            return Resolution::Annotated(&c.name);
        }
    }

    // Containment compares against the name as supplied, annotation included.
    let needle = raw_name.trim().to_lowercase();
    if needle.is_empty() {
        return Resolution::Unmatched;
    }

    rubric
        .criteria()
        .iter()
        .find(|c| {
            let candidate = c.name.to_lowercase();
            candidate.contains(&needle) || needle.contains(&candidate)
        })
        .map(|c| Resolution::Substring(c.name.as_str()))
        .unwrap_or(Resolution::Unmatched)
}

/// `"Seniority Level (Weight: 15.0%)"` → `Some("Seniority Level")`.
/// Returns None when the name carries no annotation.
fn strip_weight_annotation(raw_name: &str) -> Option<&str> {
    raw_name
        .find(WEIGHT_ANNOTATION_MARKER)
        .map(|idx| raw_name[..idx].trim())
}
