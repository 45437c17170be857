//! Error types for the analysis pipeline
//!
//! Every failure a caller can observe from `analyze` is one of these variants.
//! "No speech detected" is not an error; it is an empty `AnalysisResult`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage that validated its input and rejected it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Merge,
    Align,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Merge => write!(f, "segment merge"),
            Stage::Align => write!(f, "transcript alignment"),
        }
    }
}

/// External collaborator the orchestrator depends on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    Recognition,
    Diarization,
    FeatureExtraction,
    AudioDecoding,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collaborator::Recognition => write!(f, "recognition"),
            Collaborator::Diarization => write!(f, "diarization"),
            Collaborator::FeatureExtraction => write!(f, "feature extraction"),
            Collaborator::AudioDecoding => write!(f, "audio decoding"),
        }
    }
}

/// Error types for analysis operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AnalysisError {
    /// Invalid configuration (negative or non-finite threshold, unreadable file)
    Configuration(String),
    /// Segment at `index` starts before its predecessor
    InputOrdering { stage: Stage, index: usize },
    /// Segment at `index` has `end <= start` or non-finite bounds
    MalformedSegment {
        stage: Stage,
        index: usize,
        start: f64,
        end: f64,
    },
    /// Diarization segment at `index` uses the id reserved for unattributed text
    ReservedSpeakerId { index: usize, speaker_id: String },
    /// An external collaborator failed; the whole request is aborted
    Collaborator {
        collaborator: Collaborator,
        cause: String,
    },
}

impl AnalysisError {
    pub fn collaborator(collaborator: Collaborator, cause: impl fmt::Display) -> Self {
        AnalysisError::Collaborator {
            collaborator,
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            AnalysisError::InputOrdering { stage, index } => write!(
                f,
                "Unsorted input in {}: segment {} starts before its predecessor",
                stage, index
            ),
            AnalysisError::MalformedSegment {
                stage,
                index,
                start,
                end,
            } => write!(
                f,
                "Malformed segment {} in {}: [{}, {}]",
                index, stage, start, end
            ),
            AnalysisError::ReservedSpeakerId { index, speaker_id } => write!(
                f,
                "Diarization segment {} uses reserved speaker id {:?}",
                index, speaker_id
            ),
            AnalysisError::Collaborator {
                collaborator,
                cause,
            } => write!(f, "{} failed: {}", collaborator, cause),
        }
    }
}

impl std::error::Error for AnalysisError {}

pub type AnalysisResultOf<T> = std::result::Result<T, AnalysisError>;

/// Shared interval check used by the merge and align stages.
///
/// Rejects non-finite or empty intervals, and intervals starting before
/// `prev_start`.
pub(crate) fn check_interval(
    stage: Stage,
    index: usize,
    start: f64,
    end: f64,
    prev_start: Option<f64>,
) -> AnalysisResultOf<()> {
    if !start.is_finite() || !end.is_finite() || end <= start {
        return Err(AnalysisError::MalformedSegment {
            stage,
            index,
            start,
            end,
        });
    }
    if let Some(prev) = prev_start {
        if start < prev {
            return Err(AnalysisError::InputOrdering { stage, index });
        }
    }
    Ok(())
}
