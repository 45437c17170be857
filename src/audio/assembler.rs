// Per-speaker audio assembly
//
// Concatenates every turn of a speaker into one track so acoustic features
// can be computed per speaker. Tracks are statistical aggregates: no silence
// is inserted between turns and no gain or cross-fade is applied.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::waveform::Waveform;
use crate::diarization::MergedTurn;

/// Concatenated speech audio of one speaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerTrack {
    pub speaker_id: String,
    pub sample_rate: u32,
    #[serde(skip)]
    pub samples: Vec<f32>,
    /// Number of turns that contributed to this track
    pub turn_count: usize,
}

impl SpeakerTrack {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Builds one `SpeakerTrack` per speaker that has audio inside the file.
///
/// Tracks come back in order of each speaker's first contributing turn. A turn
/// that lies wholly outside the file contributes nothing, so a speaker made only
/// of such turns gets no track.
pub fn assemble_speaker_tracks(waveform: &Waveform, turns: &[MergedTurn]) -> Vec<SpeakerTrack> {
    let total = waveform.samples.len();
    let mut tracks: Vec<SpeakerTrack> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for turn in turns {
        let range = turn.sample_range(waveform.sample_rate, total);
        if turn.end > waveform.duration_seconds() {
            debug!(
                "Turn {} [{:.2}s-{:.2}s] clipped to file end ({:.2}s)",
                turn.speaker_id,
                turn.start,
                turn.end,
                waveform.duration_seconds()
            );
        }

        if range.is_empty() {
            debug!(
                "Turn {} [{:.2}s-{:.2}s] has no samples in the file, skipped",
                turn.speaker_id, turn.start, turn.end
            );
            continue;
        }

        let slot = *index.entry(turn.speaker_id.as_str()).or_insert_with(|| {
            tracks.push(SpeakerTrack {
                speaker_id: turn.speaker_id.clone(),
                sample_rate: waveform.sample_rate,
                samples: Vec::new(),
                turn_count: 0,
            });
            tracks.len() - 1
        });

        let track = &mut tracks[slot];
        track.samples.extend_from_slice(&waveform.samples[range]);
        track.turn_count += 1;
    }

    info!(
        "Assembled {} speaker tracks from {} turns",
        tracks.len(),
        turns.len()
    );
    for track in &tracks {
        debug!(
            "Track {}: {} turns, {:.2}s",
            track.speaker_id,
            track.turn_count,
            track.duration_seconds()
        );
    }

    tracks
}
