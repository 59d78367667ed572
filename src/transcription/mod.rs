//! Speech-to-text inference boundary.
//!
//! The orchestrator only sees the [`InferenceAdapter`] trait; the whisper-rs
//! engine behind it is loaded once per process and reused across jobs.

/// WAV decoding and conversion to whisper's input format
pub mod audio;
/// Model weight download and caching
pub mod download;
/// Whisper inference engine
pub mod engine;

pub use download::ensure_model;
pub use engine::WhisperEngine;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// What the model should do with the audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Task {
    /// Transcribe in the source language
    #[default]
    Transcribe,
    /// Translate to English
    Translate,
}

impl Task {
    /// Wire name of the task
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::Translate => "translate",
        }
    }
}

/// Timestamp granularity requested for the transcript
///
/// The inbound wire value is `false` / `true` / `"word"`; validation
/// normalizes it into this closed enum before anything else runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampMode {
    /// Plain text only
    None,
    /// Whisper's native segment boundaries
    #[default]
    Segment,
    /// One timestamp pair per word
    Word,
}

/// Per-call inference parameters, normalized at the validation boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceParams {
    /// ISO-639-1-like language code, `None` for auto-detect
    pub language: Option<String>,
    /// Transcribe or translate
    pub task: Task,
    /// Requested timestamp granularity
    pub timestamps: TimestampMode,
}

/// One timestamped piece of transcript
///
/// Serializes as `{"timestamp": [start, end], "text": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Start/end in seconds; either bound may be absent
    pub timestamp: (Option<f32>, Option<f32>),
    /// Transcript text covered by this chunk
    pub text: String,
}

/// Raw inference output, before formatting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTranscription {
    /// Full transcript text
    pub text: String,
    /// Timestamped chunks, present only when timestamps were requested
    /// and the engine produced them
    pub chunks: Option<Vec<TranscriptChunk>>,
}

/// Errors that can occur during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Failed to load model weights
    #[error("failed to load whisper model from {path}: {source}")]
    ModelLoad {
        /// Path to model file
        path: String,
        /// Underlying error
        source: anyhow::Error,
    },

    /// Failed to create a whisper inference state
    #[error("failed to create whisper state")]
    StateCreation,

    /// The audio file could not be decoded
    #[error("failed to decode audio {path}: {source}")]
    Audio {
        /// Path to the audio file
        path: String,
        /// Underlying error
        source: anyhow::Error,
    },

    /// Inference itself failed
    #[error("failed to transcribe audio: {0}")]
    Inference(#[from] anyhow::Error),
}

/// Narrow contract the orchestrator drives inference through
///
/// The engine is shared read-only across jobs; everything job-specific
/// travels in [`InferenceParams`].
#[cfg_attr(test, mockall::automock)]
pub trait InferenceAdapter: Send + Sync {
    /// Transcribe or translate a local audio file
    ///
    /// # Errors
    /// Returns error if the audio cannot be decoded or inference fails
    fn infer(
        &self,
        audio: &Path,
        params: &InferenceParams,
    ) -> Result<RawTranscription, InferenceError>;
}
