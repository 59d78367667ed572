//! Audio acquisition.
//!
//! Resolves a job's audio reference into a local file under that job's own
//! directory, so release of `<jobs_dir>/<job_id>` reclaims everything the
//! job ever acquired.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while acquiring an audio resource
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP request itself failed (DNS, connect, timeout)
    #[error("failed to fetch {url}: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying error
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("fetch of {url} failed with status {status}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: reqwest::StatusCode,
    },

    /// A local reference pointed at a file that does not exist
    #[error("audio file not found: {path}")]
    NotFound {
        /// The missing path
        path: String,
    },

    /// The reference used a scheme this fetcher cannot handle
    #[error("unsupported audio reference scheme: {reference}")]
    UnsupportedScheme {
        /// The offending reference
        reference: String,
    },

    /// Filesystem error while materializing the resource
    #[error("io error at {path}: {source}")]
    Io {
        /// Path the operation failed on
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Contract for resolving an audio reference into a local readable file
///
/// Every file a fetch creates must live under the job's `job_id` namespace
/// so the cleanup manager can release it with a single call.
#[cfg_attr(test, mockall::automock)]
pub trait ResourceFetcher: Send + Sync {
    /// Materializes `reference` as a local file owned by `job_id`
    ///
    /// # Errors
    /// Returns error on network/IO failure or an unsupported reference
    fn fetch(&self, job_id: &str, reference: &str) -> Result<PathBuf, FetchError>;
}

/// Fetcher for `http(s)://` URLs, `file://` URLs and bare local paths
pub struct HttpFetcher {
    jobs_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Creates a fetcher that stores per-job files under `jobs_dir`
    #[must_use]
    pub fn new(jobs_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn job_dir(&self, job_id: &str) -> Result<PathBuf, FetchError> {
        let dir = self.jobs_dir.join(job_id);
        fs::create_dir_all(&dir).map_err(|e| FetchError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        Ok(dir)
    }

    fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        tracing::info!(url = %url, "downloading audio");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Request {
                url: url.to_owned(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_owned(),
                status,
            });
        }

        let bytes = response.bytes().map_err(|e| FetchError::Request {
            url: url.to_owned(),
            source: e,
        })?;

        let dest = dest_dir.join(target_filename(url));

        // Write to a temp file first, then rename, so a partial download
        // never looks like a complete audio file.
        let temp_path = dest.with_extension("part");
        let mut file = fs::File::create(&temp_path).map_err(|e| FetchError::Io {
            path: temp_path.display().to_string(),
            source: e,
        })?;
        file.write_all(&bytes).map_err(|e| FetchError::Io {
            path: temp_path.display().to_string(),
            source: e,
        })?;
        drop(file);

        fs::rename(&temp_path, &dest).map_err(|e| FetchError::Io {
            path: dest.display().to_string(),
            source: e,
        })?;

        tracing::info!(
            path = %dest.display(),
            size = bytes.len(),
            "audio downloaded"
        );

        Ok(dest)
    }

    fn copy_local(&self, source: &Path, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        if !source.is_file() {
            return Err(FetchError::NotFound {
                path: source.display().to_string(),
            });
        }

        let dest = dest_dir.join(target_filename(&source.to_string_lossy()));
        fs::copy(source, &dest).map_err(|e| FetchError::Io {
            path: dest.display().to_string(),
            source: e,
        })?;

        tracing::debug!(
            source = %source.display(),
            dest = %dest.display(),
            "copied local audio into job directory"
        );

        Ok(dest)
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, job_id: &str, reference: &str) -> Result<PathBuf, FetchError> {
        let dir = self.job_dir(job_id)?;

        if reference.starts_with("http://") || reference.starts_with("https://") {
            self.download(reference, &dir)
        } else if let Some(path) = reference.strip_prefix("file://") {
            self.copy_local(Path::new(path), &dir)
        } else if reference.contains("://") {
            Err(FetchError::UnsupportedScheme {
                reference: reference.to_owned(),
            })
        } else {
            self.copy_local(Path::new(reference), &dir)
        }
    }
}

/// Derives a safe local filename from the reference's last path segment
fn target_filename(reference: &str) -> String {
    let without_query = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference);
    let last_segment = without_query.rsplit('/').next().unwrap_or("");

    let sanitized: String = last_segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "audio".to_owned()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn create_test_dir() -> PathBuf {
        let test_dir = std::env::temp_dir().join(format!(
            "whisper_fetch_test_{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&test_dir).unwrap();
        test_dir
    }

    #[test]
    fn test_target_filename_from_url() {
        assert_eq!(
            target_filename("https://example.com/media/a.wav"),
            "a.wav"
        );
    }

    #[test]
    fn test_target_filename_strips_query() {
        assert_eq!(
            target_filename("https://example.com/a.wav?token=abc&x=1"),
            "a.wav"
        );
    }

    #[test]
    fn test_target_filename_strips_fragment() {
        assert_eq!(target_filename("https://example.com/a.wav#t=10"), "a.wav");
    }

    #[test]
    fn test_target_filename_fallback_on_empty_segment() {
        assert_eq!(target_filename("https://example.com/"), "audio");
        assert_eq!(target_filename(""), "audio");
    }

    #[test]
    fn test_target_filename_sanitizes_strange_characters() {
        assert_eq!(target_filename("https://x/a b%20c.wav"), "ab20c.wav");
    }

    #[test]
    fn test_target_filename_dotfile_fallback() {
        assert_eq!(target_filename("https://x/.."), "audio");
    }

    #[test]
    fn test_fetch_local_path_copies_into_job_dir() {
        let dir = create_test_dir();
        let source = dir.join("input.wav");
        fs::write(&source, b"fake wav data").unwrap();

        let jobs_dir = dir.join("jobs");
        let fetcher = HttpFetcher::new(&jobs_dir);

        let fetched = fetcher
            .fetch("job-1", &source.to_string_lossy())
            .unwrap();

        assert!(fetched.starts_with(jobs_dir.join("job-1")));
        assert_eq!(fs::read(&fetched).unwrap(), b"fake wav data");
        // Source untouched
        assert!(source.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_fetch_file_url() {
        let dir = create_test_dir();
        let source = dir.join("clip.wav");
        fs::write(&source, b"data").unwrap();

        let fetcher = HttpFetcher::new(dir.join("jobs"));
        let reference = format!("file://{}", source.display());
        let fetched = fetcher.fetch("job-2", &reference).unwrap();
        assert!(fetched.ends_with("clip.wav"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_fetch_missing_local_file_is_not_found() {
        let dir = create_test_dir();
        let fetcher = HttpFetcher::new(dir.join("jobs"));

        let result = fetcher.fetch("job-3", "/tmp/definitely_missing_audio.wav");
        assert!(matches!(result, Err(FetchError::NotFound { .. })));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_fetch_unsupported_scheme() {
        let dir = create_test_dir();
        let fetcher = HttpFetcher::new(dir.join("jobs"));

        let result = fetcher.fetch("job-4", "ftp://example.com/a.wav");
        assert!(matches!(result, Err(FetchError::UnsupportedScheme { .. })));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_fetch_namespaces_by_job_id() {
        let dir = create_test_dir();
        let source = dir.join("same.wav");
        fs::write(&source, b"data").unwrap();

        let jobs_dir = dir.join("jobs");
        let fetcher = HttpFetcher::new(&jobs_dir);

        let a = fetcher.fetch("job-a", &source.to_string_lossy()).unwrap();
        let b = fetcher.fetch("job-b", &source.to_string_lossy()).unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with(jobs_dir.join("job-a")));
        assert!(b.starts_with(jobs_dir.join("job-b")));

        let _ = fs::remove_dir_all(&dir);
    }
}
