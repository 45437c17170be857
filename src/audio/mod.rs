// src/audio/mod.rs
pub mod assembler;
pub mod waveform;

pub use assembler::{assemble_speaker_tracks, SpeakerTrack};
pub use waveform::{WavDecoder, Waveform};
