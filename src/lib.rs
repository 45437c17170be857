// Debate analysis core - speaker-attributed transcripts and per-speaker
// acoustic features from a single recording
//
// Pipeline:
// - merge diarization segments into speaker turns
// - align recognized text with those turns
// - assemble one waveform per speaker and extract features from it
//
// Recognition, diarization, decoding and feature extraction are external
// engines behind the traits in `providers`.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod diarization;
pub mod error;
pub mod features;
pub mod providers;
pub mod rubric;
pub mod session;
pub mod transcription;

pub use analysis::{AnalysisMetadata, AnalysisOrchestrator, AnalysisResult};
pub use audio::{assemble_speaker_tracks, SpeakerTrack, WavDecoder, Waveform};
pub use config::AnalysisConfig;
pub use diarization::{merge_segments, DiarizationSegment, MergedTurn, SegmentMerger};
pub use error::{AnalysisError, Collaborator, Stage};
pub use features::{FeatureVector, OpenSmileExtractor, KEY_METRICS};
pub use providers::{AudioDecoder, Diarizer, FeatureExtractor, Recognizer, RecordingRef};
pub use rubric::{DebateFormat, EvaluationMode, FormatProfile};
pub use session::{SessionState, SessionStore};
pub use transcription::{
    align_transcript, AsrSegment, AttributedSegment, MatchKind, SpeakerLabel, TranscriptAligner,
};

/// Initialize env_logger to output to stderr (reads RUST_LOG, defaults to info).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
