use anyhow::{Context, Result};
use std::path::Path;

/// Sample rate whisper expects
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Decodes a WAV file into 16kHz mono f32 samples
///
/// Accepts 8/16/24/32-bit integer and 32-bit float WAV. Multi-channel audio
/// is downmixed by averaging; other sample rates are linearly resampled.
///
/// # Errors
/// Returns error if the file cannot be opened, is not WAV, or uses an
/// unsupported bit depth
pub fn load_mono_16k(path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open wav file {}", path.display()))?;
    let spec = reader.spec();

    tracing::debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "decoding wav"
    );

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("failed to read float samples")?,
        (hound::SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|s| f32::from(s) / 128.0))
            .collect::<Result<_, _>>()
            .context("failed to read 8-bit samples")?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| f32::from(s) / 32_768.0))
            .collect::<Result<_, _>>()
            .context("failed to read 16-bit samples")?,
        #[allow(clippy::cast_precision_loss)] // audio samples, f32 precision sufficient
        (hound::SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|s| s as f32 / 8_388_608.0))
            .collect::<Result<_, _>>()
            .context("failed to read 24-bit samples")?,
        #[allow(clippy::cast_precision_loss)]
        (hound::SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|s| s as f32 / 2_147_483_648.0))
            .collect::<Result<_, _>>()
            .context("failed to read 32-bit samples")?,
        (format, bits) => anyhow::bail!("unsupported wav format: {bits}-bit {format:?}"),
    };

    if spec.channels == 0 {
        anyhow::bail!("wav file declares zero channels");
    }

    let mono = downmix(&samples, spec.channels);
    Ok(resample_linear(&mono, spec.sample_rate, WHISPER_SAMPLE_RATE))
}

/// Averages interleaved channels down to mono
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let channels_f64 = f64::from(channels);
    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum_f64: f64 = frame.iter().map(|&s| f64::from(s)).sum();
            // f64 → f32: audio samples are stored as f32, precision sufficient
            #[allow(clippy::cast_possible_truncation)]
            {
                (sum_f64 / channels_f64) as f32
            }
        })
        .collect()
}

/// Linear interpolation resampling
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let output_len = ((samples.len() as f64) / ratio).ceil() as usize;

    let mut resampled = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let src_idx_f64 = (i as f64) * ratio;
        let src_idx_floor = src_idx_f64.floor() as usize;
        let src_idx_ceil = (src_idx_floor + 1).min(samples.len().saturating_sub(1));
        let fract = src_idx_f64 - src_idx_f64.floor();

        let sample = if src_idx_floor < samples.len() {
            let s1 = f64::from(samples[src_idx_floor]);
            let s2 = f64::from(samples[src_idx_ceil]);
            s1.mul_add(1.0 - fract, s2 * fract) as f32
        } else {
            0.0_f32
        };
        resampled.push(sample);
    }

    tracing::debug!(
        from_rate,
        to_rate,
        input_samples = samples.len(),
        output_samples = resampled.len(),
        "resampled audio"
    );

    resampled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn create_test_dir() -> PathBuf {
        let test_dir = std::env::temp_dir().join(format!(
            "whisper_audio_test_{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        fs::create_dir_all(&test_dir).unwrap();
        test_dir
    }

    fn write_wav_i16(path: &Path, sample_rate: u32, channels: u16, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix(&samples, 1), samples);
    }

    #[test]
    fn test_downmix_stereo_averages_frames() {
        let samples = vec![1.0, 0.0, 0.5, 0.5];
        let mono = downmix(&samples, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resample_identity_when_rates_match() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&samples, 16_000, 16_000), samples);
    }

    #[test]
    fn test_resample_empty_input() {
        assert!(resample_linear(&[], 48_000, 16_000).is_empty());
    }

    #[test]
    fn test_resample_downsample_length() {
        let samples = vec![0.0; 48_000];
        let out = resample_linear(&samples, 48_000, 16_000);
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn test_resample_upsample_length() {
        let samples = vec![0.0; 8_000];
        let out = resample_linear(&samples, 8_000, 16_000);
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn test_resample_preserves_constant_signal() {
        let samples = vec![0.25; 44_100];
        let out = resample_linear(&samples, 44_100, 16_000);
        assert!(out.iter().all(|&s| (s - 0.25).abs() < 1e-4));
    }

    #[test]
    fn test_load_i16_mono_16k() {
        let dir = create_test_dir();
        let path = dir.join("mono16k.wav");
        write_wav_i16(&path, 16_000, 1, &[0, 16_384, -16_384, 32_767]);

        let samples = load_mono_16k(&path).unwrap();
        assert_eq!(samples.len(), 4);
        assert!((samples[1] - 0.5).abs() < 1e-3);
        assert!((samples[2] + 0.5).abs() < 1e-3);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_stereo_downmixes() {
        let dir = create_test_dir();
        let path = dir.join("stereo.wav");
        // Two frames: (L=max, R=-max) should average to ~0
        write_wav_i16(&path, 16_000, 2, &[16_384, -16_384, 8_192, 8_192]);

        let samples = load_mono_16k(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples[0].abs() < 1e-3);
        assert!((samples[1] - 0.25).abs() < 1e-3);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_8k_resamples_to_16k() {
        let dir = create_test_dir();
        let path = dir.join("low.wav");
        write_wav_i16(&path, 8_000, 1, &[0; 800]);

        let samples = load_mono_16k(&path).unwrap();
        assert_eq!(samples.len(), 1_600);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_mono_16k(Path::new("/tmp/nonexistent_audio_file.wav"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_non_wav_fails() {
        let dir = create_test_dir();
        let path = dir.join("not_audio.wav");
        fs::write(&path, b"definitely not a wav file").unwrap();

        let result = load_mono_16k(&path);
        assert!(result.is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
