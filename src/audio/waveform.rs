// Mono waveform and WAV decoding

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};
use std::path::Path;

use crate::providers::{AudioDecoder, RecordingRef};

/// Mono f32 samples in [-1.0, 1.0] at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Read a WAV file, averaging all channels down to mono
    pub fn from_wav_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = WavReader::open(path)
            .map_err(|e| anyhow!("Failed to open WAV {}: {}", path.display(), e))?;
        let spec = reader.spec();
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(anyhow!("Invalid WAV header in {}: {:?}", path.display(), spec));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        let channels = spec.channels as usize;
        let samples: Vec<f32> = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        debug!(
            "Decoded {} ({} Hz, {} ch, {} bit) -> {} mono samples",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            samples.len()
        );

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Write as 16-bit mono PCM
    pub fn write_wav_file(&self, path: impl AsRef<Path>) -> Result<()> {
        write_pcm16(path.as_ref(), &self.samples, self.sample_rate)
    }
}

pub(crate) fn write_pcm16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| anyhow!("Failed to create WAV {}: {}", path.display(), e))?;
    for &s in samples {
        writer.write_sample((s * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// `AudioDecoder` for local WAV files
#[derive(Debug, Default, Clone)]
pub struct WavDecoder;

#[async_trait]
impl AudioDecoder for WavDecoder {
    fn name(&self) -> &str {
        "wav"
    }

    async fn decode(&self, recording: &RecordingRef) -> Result<Waveform> {
        let path = recording.as_path().to_path_buf();
        if !path.exists() {
            return Err(anyhow!("Audio file does not exist: {}", path.display()));
        }

        let waveform = tokio::task::spawn_blocking(move || Waveform::from_wav_file(&path))
            .await
            .map_err(|e| anyhow!("WAV decode task failed: {}", e))??;

        info!(
            "Decoded {} samples ({:.2} seconds) from {}",
            waveform.len(),
            waveform.duration_seconds(),
            recording
        );
        Ok(waveform)
    }
}
