use crate::transcription::{InferenceParams, Task, TimestampMode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Parameters an earlier worker accepted that are now recognized and dropped
const LEGACY_PARAMETERS: [&str; 2] = ["batch_size", "chunk_length_s"];

/// One unit of work as delivered by the queue boundary
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    /// Caller-supplied identifier, unique per submission
    pub id: String,
    /// Raw untyped request payload
    #[serde(default)]
    pub input: Value,
}

/// Validated, immutable view of a job's input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    /// URL or local path of the audio resource
    pub audio_url: String,
    /// Language code, `None` for auto-detect
    pub language: Option<String>,
    /// Transcribe or translate
    pub task: Task,
    /// Normalized timestamp granularity
    pub timestamps: TimestampMode,
}

impl TranscriptionRequest {
    /// The inference parameters this request normalizes to
    #[must_use]
    pub fn params(&self) -> InferenceParams {
        InferenceParams {
            language: self.language.clone(),
            task: self.task,
            timestamps: self.timestamps,
        }
    }
}

/// Reasons a job input is rejected before any work happens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `input` was not a JSON object
    #[error("Job input must be a JSON object")]
    NotAnObject,

    /// `audio_url` was absent
    #[error("Missing required parameter: audio_url")]
    MissingAudioUrl,

    /// `audio_url` was present but empty or not a string
    #[error("Parameter audio_url must be a non-empty string")]
    BadAudioUrl,

    /// `language` was present but not a string
    #[error("Parameter language must be a string")]
    BadLanguage,

    /// `task` was not one of the supported values
    #[error("Unsupported task: {0}")]
    UnsupportedTask(String),

    /// `return_timestamps` was not `true`, `false` or `"word"`
    #[error("Unsupported return_timestamps value: {0}")]
    BadTimestamps(String),

    /// The job id was empty or tried to escape its namespace
    #[error("Invalid job id: {0:?}")]
    BadJobId(String),
}

/// Whether a job id is usable as a per-job resource namespace
#[must_use]
pub fn is_valid_job_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(['/', '\\']) && id != "." && id != ".."
}

/// Validates a raw job input into an immutable [`TranscriptionRequest`]
///
/// Unrecognized fields are ignored for forward compatibility; the known
/// legacy parameters are dropped with a debug log.
///
/// # Errors
/// Returns [`ValidationError`] describing the first rejected field
pub fn validate(input: &Value) -> Result<TranscriptionRequest, ValidationError> {
    let object = input.as_object().ok_or(ValidationError::NotAnObject)?;

    let audio_url = match object.get("audio_url") {
        None => return Err(ValidationError::MissingAudioUrl),
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(_) => return Err(ValidationError::BadAudioUrl),
    };

    let language = match object.get("language") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ValidationError::BadLanguage),
    };

    let task = match object.get("task") {
        None | Some(Value::Null) => Task::default(),
        Some(Value::String(s)) if s == "transcribe" => Task::Transcribe,
        Some(Value::String(s)) if s == "translate" => Task::Translate,
        Some(other) => return Err(ValidationError::UnsupportedTask(render(other))),
    };

    let timestamps = match object.get("return_timestamps") {
        None | Some(Value::Null) => TimestampMode::default(),
        Some(Value::Bool(true)) => TimestampMode::Segment,
        Some(Value::Bool(false)) => TimestampMode::None,
        Some(Value::String(s)) if s == "word" => TimestampMode::Word,
        Some(other) => return Err(ValidationError::BadTimestamps(render(other))),
    };

    for legacy in LEGACY_PARAMETERS {
        if object.contains_key(legacy) {
            tracing::debug!(parameter = legacy, "ignoring legacy parameter");
        }
    }

    Ok(TranscriptionRequest {
        audio_url,
        language,
        task,
        timestamps,
    })
}

/// Renders a rejected JSON value for an error message
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
