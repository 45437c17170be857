// Transcript types and speaker alignment

pub mod aligner;
pub mod types;

pub use aligner::{align_transcript, TranscriptAligner};
pub use types::{AsrSegment, AttributedSegment, MatchKind, SpeakerLabel, UNKNOWN_SPEAKER};
