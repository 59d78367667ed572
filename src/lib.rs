//! Whisper Worker - single-job speech-to-text processing pipeline
//!
//! Turns an untrusted job request into a validated, resource-bounded unit
//! of work, drives it through acquisition, inference, formatting and
//! cleanup, and always returns a well-formed outcome.

/// Configuration management
pub mod config;
/// Audio resource acquisition
pub mod fetch;
/// Job validation, orchestration, formatting and cleanup
pub mod job;
/// Logging setup
pub mod telemetry;
/// Whisper inference adapter
pub mod transcription;
