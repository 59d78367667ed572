use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use whisper_worker::config::Config;
use whisper_worker::fetch::HttpFetcher;
use whisper_worker::job::{CleanupManager, Job, JobProcessor};
use whisper_worker::telemetry;
use whisper_worker::transcription::{ensure_model, WhisperEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    telemetry::init(config.telemetry.enabled, &config.telemetry.log_path)?;
    tracing::info!("whisper-worker starting");

    let model_path = ensure_model(&config.model)?;
    let engine = WhisperEngine::new(&model_path, config.model.threads, config.model.beam_size)
        .context("failed to load whisper model")?;

    let jobs_dir = Config::expand_path(&config.jobs.dir)?;
    let processor = Arc::new(JobProcessor::new(
        Arc::new(HttpFetcher::new(jobs_dir.clone())),
        Arc::new(engine),
        CleanupManager::new(jobs_dir),
    ));

    tracing::info!("worker ready, reading job envelopes from stdin");

    // One JSON job envelope per line in, one JSON outcome per line out.
    // The queue/HTTP layer that feeds this boundary lives outside the worker.
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read job from stdin")? else {
                    tracing::info!("input closed, shutting down");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response = handle_envelope(Arc::clone(&processor), line).await;
                #[allow(clippy::print_stdout)] // stdout is the result channel
                {
                    println!("{response}");
                }
            }
        }
    }

    Ok(())
}

/// Parses one envelope line and runs the blocking pipeline off the runtime
async fn handle_envelope(processor: Arc<JobProcessor>, line: String) -> serde_json::Value {
    let job: Job = match serde_json::from_str(&line) {
        Ok(job) => job,
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed job envelope");
            return json!({ "error": format!("Invalid job envelope: {e}") });
        }
    };

    let result = tokio::task::spawn_blocking(move || processor.process(&job)).await;

    match result {
        Ok(outcome) => outcome.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "job task aborted");
            json!({ "error": "Internal error: job task aborted" })
        }
    }
}
