use super::format::FormattedResult;
use serde_json::json;
use std::fmt;

/// Failure classification for a processed job
///
/// The kind never reaches the wire; it drives logging and tells a caller
/// reading our diagnostics whether a retry can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing request fields; retrying the same input is pointless
    InvalidInput,
    /// The audio resource could not be materialized; retry with a corrected reference
    AcquisitionFailed,
    /// The model or runtime failed during processing; retry may succeed
    InferenceFailed,
    /// A bug in formatting or orchestration; non-retryable, report upstream
    Internal,
}

impl ErrorKind {
    /// Stable name used in log fields
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::AcquisitionFailed => "acquisition_failed",
            Self::InferenceFailed => "inference_failed",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure with the collaborator's message preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Failure classification
    pub kind: ErrorKind,
    /// Human-readable diagnostic, surfaced to the caller verbatim
    pub message: String,
}

impl ErrorReport {
    /// Creates a report of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Final result of one processing attempt: exactly one of result or error
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The formatted transcription
    Success(FormattedResult),
    /// The classified failure
    Failure(ErrorReport),
}

impl JobOutcome {
    /// Whether this outcome carries a transcription
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Renders the outcome into the wire shape
    ///
    /// Success becomes `{"text": ..., "chunks": [...]?}`, failure becomes
    /// `{"error": "<message>"}`. A result that cannot be encoded is a bug
    /// and is reported as an internal error instead of panicking.
    #[must_use]
    pub fn into_response(self) -> serde_json::Value {
        match self {
            Self::Success(result) => match serde_json::to_value(&result) {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode job result");
                    json!({
                        "error": format!("Internal error: failed to encode result: {e}")
                    })
                }
            },
            Self::Failure(report) => json!({ "error": report.message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptChunk;

    #[test]
    fn test_error_kind_log_names() {
        assert_eq!(ErrorKind::InvalidInput.as_str(), "invalid_input");
        assert_eq!(ErrorKind::AcquisitionFailed.as_str(), "acquisition_failed");
        assert_eq!(ErrorKind::InferenceFailed.as_str(), "inference_failed");
        assert_eq!(ErrorKind::Internal.as_str(), "internal");
    }

    #[test]
    fn test_failure_response_shape() {
        let outcome = JobOutcome::Failure(ErrorReport::new(
            ErrorKind::InvalidInput,
            "Missing required parameter: audio_url",
        ));
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.into_response(),
            json!({"error": "Missing required parameter: audio_url"})
        );
    }

    #[test]
    fn test_success_response_without_chunks() {
        let outcome = JobOutcome::Success(FormattedResult {
            text: "hello world".to_owned(),
            chunks: None,
        });
        assert!(outcome.is_success());

        let response = outcome.into_response();
        assert_eq!(response, json!({"text": "hello world"}));
        assert!(response.get("chunks").is_none());
    }

    #[test]
    fn test_success_response_with_chunks() {
        let outcome = JobOutcome::Success(FormattedResult {
            text: "hello world".to_owned(),
            chunks: Some(vec![TranscriptChunk {
                timestamp: (Some(0.0), Some(1.5)),
                text: "hello world".to_owned(),
            }]),
        });

        let response = outcome.into_response();
        assert_eq!(
            response,
            json!({
                "text": "hello world",
                "chunks": [{"timestamp": [0.0, 1.5], "text": "hello world"}]
            })
        );
    }

    #[test]
    fn test_error_report_display_includes_kind() {
        let report = ErrorReport::new(ErrorKind::AcquisitionFailed, "boom");
        assert_eq!(report.to_string(), "acquisition_failed: boom");
    }
}
