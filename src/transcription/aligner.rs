// Transcript alignment - assigns a speaker to every recognized segment
//
// Recognizer and diarizer boundaries never line up exactly, so each segment
// goes to the turn it overlaps most, and falls back to the nearest turn only
// when that turn is within `max_nearest_gap`.

use log::{debug, info};

use super::types::{AsrSegment, AttributedSegment, MatchKind, SpeakerLabel};
use crate::config::{validate_threshold, DEFAULT_MAX_NEAREST_GAP};
use crate::diarization::MergedTurn;
use crate::error::{check_interval, AnalysisResultOf, Stage};

#[derive(Debug, Clone, Copy)]
pub struct TranscriptAligner {
    max_nearest_gap: f64,
}

impl Default for TranscriptAligner {
    fn default() -> Self {
        Self {
            max_nearest_gap: DEFAULT_MAX_NEAREST_GAP,
        }
    }
}

/// Overlap in seconds between `[a_start, a_end)` and `[b_start, b_end)`
fn overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    (a_end.min(b_end) - a_start.max(b_start)).max(0.0)
}

/// Distance between two non-overlapping intervals
fn gap(segment: &AsrSegment, turn: &MergedTurn) -> f64 {
    if segment.end <= turn.start {
        turn.start - segment.end
    } else if segment.start >= turn.end {
        segment.start - turn.end
    } else {
        0.0
    }
}

impl TranscriptAligner {
    pub fn new(max_nearest_gap: f64) -> AnalysisResultOf<Self> {
        validate_threshold("max_nearest_gap", max_nearest_gap)?;
        Ok(Self { max_nearest_gap })
    }

    pub fn max_nearest_gap(&self) -> f64 {
        self.max_nearest_gap
    }

    /// Attribute each segment to a speaker. Output has one entry per input
    /// segment, in input order.
    pub fn align(
        &self,
        segments: &[AsrSegment],
        turns: &[MergedTurn],
    ) -> AnalysisResultOf<Vec<AttributedSegment>> {
        let mut prev_start = None;
        for (index, seg) in segments.iter().enumerate() {
            check_interval(Stage::Align, index, seg.start, seg.end, prev_start)?;
            prev_start = Some(seg.start);
        }

        let attributed: Vec<AttributedSegment> = segments
            .iter()
            .map(|seg| {
                let (speaker, match_kind) = self.attribute(seg, turns);
                AttributedSegment {
                    speaker,
                    start: seg.start,
                    end: seg.end,
                    text: seg.text.clone(),
                    match_kind,
                }
            })
            .collect();

        let unknown = attributed.iter().filter(|s| s.speaker.is_unknown()).count();
        info!(
            "Aligned {} transcript segments against {} turns ({} unknown)",
            attributed.len(),
            turns.len(),
            unknown
        );

        Ok(attributed)
    }

    fn attribute(&self, seg: &AsrSegment, turns: &[MergedTurn]) -> (SpeakerLabel, MatchKind) {
        // Strict `>` keeps the earliest turn on ties
        let mut best: Option<(&MergedTurn, f64)> = None;
        for turn in turns {
            let o = overlap(seg.start, seg.end, turn.start, turn.end);
            if best.map_or(true, |(_, best_o)| o > best_o) {
                best = Some((turn, o));
            }
        }

        if let Some((turn, seconds)) = best {
            if seconds > 0.0 {
                return (
                    SpeakerLabel::Speaker(turn.speaker_id.clone()),
                    MatchKind::Overlap { seconds },
                );
            }
        }

        let mut nearest: Option<(&MergedTurn, f64)> = None;
        for turn in turns {
            let g = gap(seg, turn);
            if nearest.map_or(true, |(_, best_g)| g < best_g) {
                nearest = Some((turn, g));
            }
        }

        match nearest {
            Some((turn, gap)) if gap <= self.max_nearest_gap => {
                debug!(
                    "Segment [{:.2}s-{:.2}s] has no overlap, nearest turn {} is {:.2}s away",
                    seg.start, seg.end, turn.speaker_id, gap
                );
                (
                    SpeakerLabel::Speaker(turn.speaker_id.clone()),
                    MatchKind::Nearest { gap },
                )
            }
            _ => {
                debug!(
                    "Segment [{:.2}s-{:.2}s] left unassigned",
                    seg.start, seg.end
                );
                (SpeakerLabel::Unknown, MatchKind::Unassigned)
            }
        }
    }
}

/// Align with an explicit nearest-turn threshold
pub fn align_transcript(
    segments: &[AsrSegment],
    turns: &[MergedTurn],
    max_nearest_gap: f64,
) -> AnalysisResultOf<Vec<AttributedSegment>> {
    TranscriptAligner::new(max_nearest_gap)?.align(segments, turns)
}
