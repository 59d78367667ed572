use super::request;
use std::fs;
use std::path::{Path, PathBuf};

/// Releases every temporary resource a job acquired
///
/// All per-job files live under `<jobs_dir>/<job_id>`, so one call reclaims
/// whatever the fetcher materialized. Release is best-effort: failures are
/// logged and swallowed, and never mask the job's real outcome.
pub struct CleanupManager {
    jobs_dir: PathBuf,
}

impl CleanupManager {
    /// Creates a manager rooted at `jobs_dir`
    pub fn new(jobs_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
        }
    }

    /// Root directory the per-job namespaces live under
    #[must_use]
    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    /// Removes the job's resource directory, if any
    ///
    /// Idempotent: calling it twice, or for a job that never acquired
    /// anything, is a no-op. A job id that could escape the jobs directory
    /// is refused and logged.
    pub fn release(&self, job_id: &str) {
        if !request::is_valid_job_id(job_id) {
            tracing::warn!(job_id, "refusing to release unsafe job id");
            return;
        }

        let job_path = self.jobs_dir.join(job_id);
        if !job_path.exists() {
            tracing::debug!(job_id, "no resources to release");
            return;
        }

        match fs::remove_dir_all(&job_path) {
            Ok(()) => {
                tracing::info!(
                    job_id,
                    path = %job_path.display(),
                    "released job resources"
                );
            }
            Err(e) => {
                tracing::warn!(
                    job_id,
                    path = %job_path.display(),
                    error = %e,
                    "failed to release job resources"
                );
            }
        }
    }
}
