//! Turn merging - collapses same-speaker diarization segments split by short gaps

use log::debug;

use super::types::{DiarizationSegment, MergedTurn};
use crate::config::{validate_threshold, DEFAULT_MAX_GAP};
use crate::error::{check_interval, AnalysisError, AnalysisResultOf, Stage};
use crate::transcription::UNKNOWN_SPEAKER;

/// Merges consecutive same-speaker segments whose gap is at most `max_gap`
#[derive(Debug, Clone, Copy)]
pub struct SegmentMerger {
    max_gap: f64,
}

impl Default for SegmentMerger {
    fn default() -> Self {
        Self {
            max_gap: DEFAULT_MAX_GAP,
        }
    }
}

impl SegmentMerger {
    pub fn new(max_gap: f64) -> AnalysisResultOf<Self> {
        validate_threshold("max_gap", max_gap)?;
        Ok(Self { max_gap })
    }

    pub fn max_gap(&self) -> f64 {
        self.max_gap
    }

    /// Merge segments sorted ascending by start.
    ///
    /// A negative gap (overlapping segments of one speaker) also merges.
    /// Unsorted or malformed input is rejected, never repaired, and so is a
    /// speaker id equal to the reserved `UNKNOWN` label.
    pub fn merge(&self, segments: &[DiarizationSegment]) -> AnalysisResultOf<Vec<MergedTurn>> {
        let mut turns: Vec<MergedTurn> = Vec::new();
        let mut current: Option<MergedTurn> = None;
        let mut prev_start = None;

        for (index, seg) in segments.iter().enumerate() {
            check_interval(Stage::Merge, index, seg.start, seg.end, prev_start)?;
            prev_start = Some(seg.start);
            if seg.speaker_id == UNKNOWN_SPEAKER {
                return Err(AnalysisError::ReservedSpeakerId {
                    index,
                    speaker_id: seg.speaker_id.clone(),
                });
            }

            if let Some(acc) = current.as_mut() {
                if acc.speaker_id == seg.speaker_id && seg.start - acc.end <= self.max_gap {
                    acc.end = acc.end.max(seg.end);
                    continue;
                }
            }

            let next = MergedTurn {
                start: seg.start,
                end: seg.end,
                speaker_id: seg.speaker_id.clone(),
            };
            if let Some(done) = current.replace(next) {
                turns.push(done);
            }
        }

        if let Some(done) = current {
            turns.push(done);
        }

        debug!(
            "Merged {} diarization segments into {} turns (max_gap {:.2}s)",
            segments.len(),
            turns.len(),
            self.max_gap
        );

        Ok(turns)
    }
}

/// Merge with an explicit gap threshold
pub fn merge_segments(
    segments: &[DiarizationSegment],
    max_gap: f64,
) -> AnalysisResultOf<Vec<MergedTurn>> {
    SegmentMerger::new(max_gap)?.merge(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, spk: &str) -> DiarizationSegment {
        DiarizationSegment::new(start, end, spk)
    }

    fn bounds(turns: &[MergedTurn]) -> Vec<(f64, f64, &str)> {
        turns
            .iter()
            .map(|t| (t.start, t.end, t.speaker_id.as_str()))
            .collect()
    }

    #[test]
    fn test_merges_small_gap_only() {
        let input = vec![seg(0.0, 5.0, "A"), seg(5.1, 9.0, "A"), seg(9.5, 12.0, "B")];
        let turns = merge_segments(&input, 0.3).unwrap();
        assert_eq!(bounds(&turns), vec![(0.0, 9.0, "A"), (9.5, 12.0, "B")]);
    }

    #[test]
    fn test_gap_above_threshold_is_kept() {
        let input = vec![seg(0.0, 1.0, "A"), seg(1.5, 2.0, "A")];
        let turns = merge_segments(&input, 0.3).unwrap();
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn test_overlapping_same_speaker_merges() {
        // Windowed inference can emit a contained segment
        let input = vec![seg(0.0, 4.0, "A"), seg(3.0, 3.5, "A"), seg(3.8, 6.0, "A")];
        let turns = merge_segments(&input, 0.3).unwrap();
        assert_eq!(bounds(&turns), vec![(0.0, 6.0, "A")]);
    }

    #[test]
    fn test_interleaved_speakers_not_merged() {
        let input = vec![seg(0.0, 1.0, "A"), seg(1.1, 2.0, "B"), seg(2.1, 3.0, "A")];
        let turns = merge_segments(&input, 0.3).unwrap();
        assert_eq!(turns.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_segments(&[], 0.3).unwrap().is_empty());
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            seg(0.0, 5.0, "A"),
            seg(5.1, 9.0, "A"),
            seg(9.2, 10.0, "B"),
            seg(10.1, 12.0, "B"),
            seg(12.9, 14.0, "A"),
        ];
        let once = merge_segments(&input, 0.3).unwrap();
        let as_segments: Vec<DiarizationSegment> = once.iter().cloned().map(Into::into).collect();
        let twice = merge_segments(&as_segments, 0.3).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unsorted_input_rejected() {
        let input = vec![seg(2.0, 3.0, "A"), seg(1.0, 1.5, "B")];
        assert_eq!(
            merge_segments(&input, 0.3),
            Err(AnalysisError::InputOrdering {
                stage: Stage::Merge,
                index: 1
            })
        );
    }

    #[test]
    fn test_malformed_interval_rejected() {
        let input = vec![seg(2.0, 2.0, "A")];
        assert!(matches!(
            merge_segments(&input, 0.3),
            Err(AnalysisError::MalformedSegment { index: 0, .. })
        ));
    }

    #[test]
    fn test_reserved_unknown_speaker_id_rejected() {
        let input = vec![seg(0.0, 1.0, "A"), seg(1.5, 2.0, "UNKNOWN")];
        assert_eq!(
            merge_segments(&input, 0.3),
            Err(AnalysisError::ReservedSpeakerId {
                index: 1,
                speaker_id: "UNKNOWN".to_string()
            })
        );
        // Only the exact label is reserved
        assert!(merge_segments(&[seg(0.0, 1.0, "unknown")], 0.3).is_ok());
    }

    #[test]
    fn test_negative_gap_threshold_rejected() {
        assert!(matches!(
            SegmentMerger::new(-0.3),
            Err(AnalysisError::Configuration(_))
        ));
    }
}
