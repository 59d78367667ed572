use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Worker configuration, loaded from `~/.whisper-worker.toml`
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Model selection and inference settings
    pub model: ModelConfig,
    /// Per-job temporary storage
    pub jobs: JobsConfig,
    /// Logging destination
    pub telemetry: TelemetryConfig,
}

/// Model selection and inference settings
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// ggml model name (e.g. `large-v3`, `tiny`)
    pub name: String,
    /// Path to the model file, `~` allowed
    pub path: String,
    /// CPU threads for inference
    pub threads: usize,
    /// Beam search width, 1 for greedy
    pub beam_size: usize,
}

/// Per-job temporary storage
#[derive(Debug, Deserialize, Clone)]
pub struct JobsConfig {
    /// Directory job namespaces are created under, `~` allowed
    pub dir: String,
}

/// Logging destination
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Log to a file instead of stderr
    pub enabled: bool,
    /// Log file path, `~` allowed
    pub log_path: String,
}

impl Config {
    /// Load config from `~/.whisper-worker.toml`, writing defaults on first run
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default(&config_path).context("failed to create default config")?;
        }

        let contents =
            fs::read_to_string(&config_path).context("failed to read config file")?;

        let config: Self = toml::from_str(&contents).context("failed to parse config TOML")?;

        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".whisper-worker.toml"))
    }

    fn create_default(path: &PathBuf) -> Result<()> {
        let default_config = r#"[model]
name = "large-v3"
path = "~/.whisper-worker/models/ggml-large-v3.bin"
threads = 4
beam_size = 5

[jobs]
dir = "~/.whisper-worker/jobs"

[telemetry]
enabled = false
log_path = "~/.whisper-worker/worker.log"
"#;
        fs::write(path, default_config).context("failed to write default config")?;
        Ok(())
    }

    /// Expand `~` in paths to home directory
    ///
    /// # Errors
    /// Returns error if `HOME` is not set
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        path.strip_prefix("~/").map_or_else(
            || Ok(PathBuf::from(path)),
            |stripped| {
                let home =
                    std::env::var("HOME").context("HOME environment variable not set")?;
                Ok(PathBuf::from(home).join(stripped))
            },
        )
    }
}
