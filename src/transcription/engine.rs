use super::{
    audio, InferenceAdapter, InferenceError, InferenceParams, RawTranscription, Task,
    TimestampMode, TranscriptChunk,
};
use anyhow::Context;
use std::path::Path;
use std::sync::{Arc, Mutex};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Whisper inference engine
///
/// Loads the model once and keeps it behind a mutex; each call builds its
/// own inference state and parameter set, so the shared context is never
/// mutated per job.
pub struct WhisperEngine {
    /// Whisper context (thread-safe)
    ctx: Arc<Mutex<WhisperContext>>,
    /// Number of CPU threads for inference
    threads: i32,
    /// Beam search width
    beam_size: i32,
}

impl WhisperEngine {
    /// Determines sampling strategy based on beam size (pure, testable)
    const fn sampling_strategy(beam_size: i32) -> SamplingStrategy {
        if beam_size > 1 {
            SamplingStrategy::BeamSearch {
                beam_size,
                patience: -1.0,
            }
        } else {
            SamplingStrategy::Greedy { best_of: 1 }
        }
    }

    /// Creates a new `WhisperEngine` by loading the model from the given path
    ///
    /// # Errors
    /// Returns error if the model file doesn't exist, is invalid, or if
    /// `threads`/`beam_size` are zero or exceed `i32::MAX`
    pub fn new(
        model_path: &Path,
        threads: usize,
        beam_size: usize,
    ) -> Result<Self, InferenceError> {
        if threads == 0 {
            return Err(InferenceError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("threads must be > 0"),
            });
        }
        if beam_size == 0 {
            return Err(InferenceError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("beam_size must be > 0"),
            });
        }

        let threads_i32 = i32::try_from(threads).map_err(|_| InferenceError::ModelLoad {
            path: model_path.display().to_string(),
            source: anyhow::anyhow!("threads value too large (max: {})", i32::MAX),
        })?;
        let beam_size_i32 = i32::try_from(beam_size).map_err(|_| InferenceError::ModelLoad {
            path: model_path.display().to_string(),
            source: anyhow::anyhow!("beam_size value too large (max: {})", i32::MAX),
        })?;

        tracing::info!(
            path = %model_path.display(),
            threads = threads,
            beam_size = beam_size,
            "loading whisper model"
        );

        let path_str = model_path
            .to_str()
            .ok_or_else(|| InferenceError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("model path contains invalid UTF-8"),
            })?;

        let params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(path_str, params).map_err(|e| {
            InferenceError::ModelLoad {
                path: model_path.display().to_string(),
                source: anyhow::anyhow!("{e:?}"),
            }
        })?;

        tracing::info!("whisper model loaded successfully");

        Ok(Self {
            ctx: Arc::new(Mutex::new(ctx)),
            threads: threads_i32,
            beam_size: beam_size_i32,
        })
    }

    /// Runs inference on 16kHz mono samples
    fn run(
        &self,
        samples: &[f32],
        params: &InferenceParams,
    ) -> Result<RawTranscription, InferenceError> {
        let _span = tracing::debug_span!("inference", samples = samples.len()).entered();

        let mut state = self
            .ctx
            .lock()
            .map_err(|e| anyhow::anyhow!("mutex poisoned: {e}"))?
            .create_state()
            .map_err(|_| InferenceError::StateCreation)?;

        let strategy = Self::sampling_strategy(self.beam_size);
        let mut full_params = FullParams::new(strategy);
        full_params.set_n_threads(self.threads);
        full_params.set_print_special(false);
        full_params.set_print_progress(false);
        full_params.set_print_realtime(false);
        full_params.set_print_timestamps(false);
        full_params.set_language(params.language.as_deref());
        full_params.set_translate(matches!(params.task, Task::Translate));

        // Word mode: token timestamps with one-word segments, so every
        // segment below maps to exactly one word.
        if params.timestamps == TimestampMode::Word {
            full_params.set_token_timestamps(true);
            full_params.set_split_on_word(true);
            full_params.set_max_len(1);
        }

        let start = std::time::Instant::now();
        state
            .full(full_params, samples)
            .context("whisper inference failed")?;
        let inference_duration = start.elapsed();

        let mut text = String::new();
        let mut chunks = (params.timestamps != TimestampMode::None).then(Vec::new);

        for segment in state.as_iter() {
            let piece = segment.to_string();
            text.push_str(&piece);

            if let Some(chunks) = chunks.as_mut() {
                // Segment bounds are in centiseconds (10ms units)
                #[allow(clippy::cast_precision_loss)]
                let start_s = segment.start_timestamp() as f32 / 100.0;
                #[allow(clippy::cast_precision_loss)]
                let end_s = segment.end_timestamp() as f32 / 100.0;
                chunks.push(TranscriptChunk {
                    timestamp: (Some(start_s), Some(end_s)),
                    text: piece.trim().to_owned(),
                });
            }
        }

        let text = text.trim().to_owned();

        tracing::info!(
            segments = state.full_n_segments(),
            text_len = text.len(),
            inference_ms = inference_duration.as_millis(),
            "inference completed"
        );

        Ok(RawTranscription { text, chunks })
    }
}

impl InferenceAdapter for WhisperEngine {
    fn infer(
        &self,
        audio_path: &Path,
        params: &InferenceParams,
    ) -> Result<RawTranscription, InferenceError> {
        let samples =
            audio::load_mono_16k(audio_path).map_err(|e| InferenceError::Audio {
                path: audio_path.display().to_string(),
                source: e,
            })?;
        self.run(&samples, params)
    }
}

// SAFETY: WhisperEngine is thread-safe because:
// 1. WhisperContext is wrapped in Arc<Mutex<>>, ensuring exclusive access
// 2. All methods require acquiring the mutex lock before accessing the context
// 3. No shared mutable state exists outside the mutex
// 4. whisper-rs WhisperContext is documented as thread-safe when properly synchronized
#[allow(unsafe_code)]
unsafe impl Send for WhisperEngine {}
#[allow(unsafe_code)]
unsafe impl Sync for WhisperEngine {}
