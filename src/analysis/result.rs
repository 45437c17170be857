// Analysis result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::features::FeatureVector;
use crate::providers::RecordingRef;
use crate::transcription::AttributedSegment;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub request_id: Uuid,
    pub source: RecordingRef,
    /// Speaker ids observed after merging, in order of first turn
    pub speakers: Vec<String>,
    /// Speaker-count hint that was passed to diarization
    pub expected_speakers: Option<usize>,
    pub duration_seconds: f64,
    pub analyzed_at: DateTime<Utc>,
}

/// Speaker-attributed transcript plus per-speaker acoustic features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub transcript: Vec<AttributedSegment>,
    pub metrics: BTreeMap<String, FeatureVector>,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// True when no speech was detected at all
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty() && self.metrics.is_empty()
    }

    /// Transcript segments attributed to `speaker_id`, in order
    pub fn segments_for<'a>(
        &'a self,
        speaker_id: &'a str,
    ) -> impl Iterator<Item = &'a AttributedSegment> + 'a {
        self.transcript
            .iter()
            .filter(move |s| s.speaker.speaker_id() == Some(speaker_id))
    }

    /// Concatenated text spoken by `speaker_id`
    pub fn text_for(&self, speaker_id: &str) -> String {
        self.segments_for(speaker_id)
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
