// Transcript types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label written for transcript segments with no confident speaker match.
/// Reserved: diarization segments carrying this id are rejected at merge time.
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// A recognized text segment. Carries no speaker identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
}

impl AsrSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Speaker attributed to a transcript segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpeakerLabel {
    Speaker(String),
    Unknown,
}

impl SpeakerLabel {
    pub fn speaker_id(&self) -> Option<&str> {
        match self {
            SpeakerLabel::Speaker(id) => Some(id),
            SpeakerLabel::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SpeakerLabel::Unknown)
    }

    pub fn as_str(&self) -> &str {
        match self {
            SpeakerLabel::Speaker(id) => id,
            SpeakerLabel::Unknown => UNKNOWN_SPEAKER,
        }
    }
}

impl From<String> for SpeakerLabel {
    fn from(value: String) -> Self {
        if value == UNKNOWN_SPEAKER {
            SpeakerLabel::Unknown
        } else {
            SpeakerLabel::Speaker(value)
        }
    }
}

impl From<SpeakerLabel> for String {
    fn from(label: SpeakerLabel) -> Self {
        match label {
            SpeakerLabel::Speaker(id) => id,
            SpeakerLabel::Unknown => UNKNOWN_SPEAKER.to_string(),
        }
    }
}

impl fmt::Display for SpeakerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a transcript segment obtained its speaker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    /// Overlapped the chosen turn by `seconds` (> 0)
    Overlap { seconds: f64 },
    /// No overlap with any turn; nearest turn was `gap` seconds away
    Nearest { gap: f64 },
    /// No turn close enough
    Unassigned,
}

/// A transcript segment with its speaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedSegment {
    pub speaker: SpeakerLabel,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub match_kind: MatchKind,
}
