use thiserror::Error;

use crate::cache::CacheError;
use crate::llm_client::LlmError;

/// Max characters of post-extraction text kept on a `MalformedResponse`.
pub const EXTRACTED_PREVIEW_CHARS: usize = 1000;
/// Max characters of the raw generator output kept on a `MalformedResponse`.
pub const ORIGINAL_PREVIEW_CHARS: usize = 500;

/// Matcher error type.
///
/// `MalformedResponse` and `Schema` are fatal for one generation call and are
/// meant to be retried upstream. `EmptyInput` means the caller handed the
/// aggregator nothing to evaluate. A criterion name that fails to resolve is
/// never an error; it only lowers `total_weight_used`.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Malformed response: {reason}")]
    MalformedResponse {
        reason: String,
        /// 1-based parser position, when the failure came from the JSON parser.
        line: Option<usize>,
        column: Option<usize>,
        extracted: String,
        original: String,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Nothing to aggregate: no criterion matched and no scores were supplied")]
    EmptyInput,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl MatchError {
    /// Builds a `MalformedResponse`, truncating both text previews.
    pub fn malformed(
        reason: impl Into<String>,
        position: Option<(usize, usize)>,
        extracted: &str,
        original: &str,
    ) -> Self {
        MatchError::MalformedResponse {
            reason: reason.into(),
            line: position.map(|(line, _)| line),
            column: position.map(|(_, column)| column),
            extracted: truncate_chars(extracted, EXTRACTED_PREVIEW_CHARS),
            original: truncate_chars(original, ORIGINAL_PREVIEW_CHARS),
        }
    }

    /// True for the error kinds that abort a single generation call and are worth retrying
    /// with the same prompt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MatchError::MalformedResponse { .. } | MatchError::Schema(_) | MatchError::Llm(_)
        )
    }
}

/// Char-boundary-safe prefix of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_truncates_previews() {
        let long = "x".repeat(5000);
        let err = MatchError::malformed("bad", Some((1, 7)), &long, &long);
        match err {
            MatchError::MalformedResponse {
                line,
                column,
                extracted,
                original,
                ..
            } => {
                assert_eq!(line, Some(1));
                assert_eq!(column, Some(7));
                assert_eq!(extracted.len(), EXTRACTED_PREVIEW_CHARS);
                assert_eq!(original.len(), ORIGINAL_PREVIEW_CHARS);
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("résumé", 2), "ré");
    }

    #[test]
    fn test_empty_input_is_not_retryable() {
        assert!(!MatchError::EmptyInput.is_retryable());
        assert!(MatchError::Schema("missing criteria".to_string()).is_retryable());
    }
}
