// Speaker diarization types and turn merging
//
// Diarization itself runs in an external engine (see `providers::Diarizer`);
// this module only normalizes its output into speaker turns.

pub mod merger;
pub mod types;

pub use merger::{merge_segments, SegmentMerger};
pub use types::{DiarizationSegment, MergedTurn};
