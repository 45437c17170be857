//! Capability traits for the external engines the pipeline depends on
//!
//! Recognition, diarization, feature extraction and audio decoding are all
//! behind these traits so the pipeline can run against deterministic fakes.
//! Implementations report failures with `anyhow`; the orchestrator tags them
//! with the originating collaborator.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::audio::{SpeakerTrack, Waveform};
use crate::diarization::DiarizationSegment;
use crate::features::FeatureVector;
use crate::transcription::AsrSegment;

/// Reference to a source recording (a local path or an opaque URI)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingRef(String);

impl RecordingRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl From<&Path> for RecordingRef {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for RecordingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Speech-to-text engine
#[async_trait]
pub trait Recognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Timestamped text segments ordered by start
    async fn transcribe(&self, recording: &RecordingRef) -> Result<Vec<AsrSegment>>;
}

/// Speaker diarization engine
#[async_trait]
pub trait Diarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Speaker segments for the recording. `expected_speakers` is a hint
    /// passed straight to the engine.
    async fn diarize(
        &self,
        recording: &RecordingRef,
        expected_speakers: Option<usize>,
    ) -> Result<Vec<DiarizationSegment>>;
}

/// Acoustic feature extractor over a single-speaker waveform
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(&self, track: &SpeakerTrack) -> Result<FeatureVector>;
}

/// Decodes a recording into a mono waveform
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    fn name(&self) -> &str;

    async fn decode(&self, recording: &RecordingRef) -> Result<Waveform>;
}
