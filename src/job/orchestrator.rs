use super::cleanup::CleanupManager;
use super::format;
use super::outcome::{ErrorKind, ErrorReport, JobOutcome};
use super::request::{self, Job, ValidationError};
use crate::fetch::ResourceFetcher;
use crate::transcription::InferenceAdapter;
use std::sync::Arc;

/// Drives one job through validate → acquire → infer → format → cleanup
///
/// The single entry point is [`JobProcessor::process`]: synchronous,
/// run-to-completion, no internal concurrency. Every failure at any stage
/// is mapped to a classified [`ErrorReport`]; nothing propagates past
/// `process` as a fault.
pub struct JobProcessor {
    fetcher: Arc<dyn ResourceFetcher>,
    adapter: Arc<dyn InferenceAdapter>,
    cleanup: CleanupManager,
}

impl JobProcessor {
    /// Wires the processor to its collaborators
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        adapter: Arc<dyn InferenceAdapter>,
        cleanup: CleanupManager,
    ) -> Self {
        Self {
            fetcher,
            adapter,
            cleanup,
        }
    }

    /// Processes one job and returns exactly one outcome
    ///
    /// Cleanup runs exactly once per job, after the pipeline finishes or
    /// fails, before this returns; its failures are logged and never
    /// override the pipeline's outcome.
    pub fn process(&self, job: &Job) -> JobOutcome {
        let _span = tracing::info_span!("job", id = %job.id).entered();
        tracing::info!("processing job");

        let outcome = self.run_pipeline(job);

        self.cleanup.release(&job.id);

        match &outcome {
            JobOutcome::Success(result) => {
                tracing::info!(text_len = result.text.len(), "job completed");
            }
            JobOutcome::Failure(report) => {
                tracing::warn!(
                    kind = report.kind.as_str(),
                    error = %report.message,
                    "job failed"
                );
            }
        }

        outcome
    }

    /// Fail-fast pipeline: the first failing step decides the outcome
    fn run_pipeline(&self, job: &Job) -> JobOutcome {
        if !request::is_valid_job_id(&job.id) {
            return JobOutcome::Failure(ErrorReport::new(
                ErrorKind::InvalidInput,
                ValidationError::BadJobId(job.id.clone()).to_string(),
            ));
        }

        let req = match request::validate(&job.input) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "rejected job input");
                return JobOutcome::Failure(ErrorReport::new(
                    ErrorKind::InvalidInput,
                    e.to_string(),
                ));
            }
        };

        let audio_path = match self.fetcher.fetch(&job.id, &req.audio_url) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "audio acquired");
                path
            }
            Err(e) => {
                return JobOutcome::Failure(ErrorReport::new(
                    ErrorKind::AcquisitionFailed,
                    e.to_string(),
                ));
            }
        };

        let raw = match self.adapter.infer(&audio_path, &req.params()) {
            Ok(raw) => raw,
            Err(e) => {
                return JobOutcome::Failure(ErrorReport::new(
                    ErrorKind::InferenceFailed,
                    e.to_string(),
                ));
            }
        };

        JobOutcome::Success(format::format(raw, req.timestamps))
    }
}
