//! Diarization types

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A speaker segment as produced by the diarization collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiarizationSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Opaque speaker identifier (e.g. "SPEAKER_00")
    pub speaker_id: String,
}

impl DiarizationSegment {
    pub fn new(start: f64, end: f64, speaker_id: impl Into<String>) -> Self {
        Self {
            start,
            end,
            speaker_id: speaker_id.into(),
        }
    }
}

/// A speaker turn after same-speaker segments have been merged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTurn {
    pub start: f64,
    pub end: f64,
    pub speaker_id: String,
}

impl MergedTurn {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Sample indices covered by this turn, clipped to `[0, total_samples)`.
    ///
    /// Diarizers occasionally report a last turn that runs past the end of
    /// the file; the range is truncated rather than rejected.
    pub fn sample_range(&self, sample_rate: u32, total_samples: usize) -> Range<usize> {
        let to_index = |t: f64| -> usize {
            let idx = (t * sample_rate as f64).floor();
            if idx <= 0.0 {
                0
            } else {
                (idx as usize).min(total_samples)
            }
        };
        let start = to_index(self.start);
        let end = to_index(self.end).max(start);
        start..end
    }
}

impl From<MergedTurn> for DiarizationSegment {
    fn from(turn: MergedTurn) -> Self {
        Self {
            start: turn.start,
            end: turn.end,
            speaker_id: turn.speaker_id,
        }
    }
}
