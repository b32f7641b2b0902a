//! Audio capture and playback
//!
//! Microphone capture runs on a dedicated cpal thread that converts native
//! device audio to fixed-size 16-bit mono chunks; playback appends inbound
//! PCM to a rodio sink so chunks play in arrival order.

pub mod mic;
pub mod speaker;

pub use mic::{CpalMicrophone, MicStream, Microphone};
pub use speaker::{RodioSpeaker, Speaker, SpeakerStream};

/// PCM stream parameters shared by capture and playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono)
    pub channels: u16,
    /// Sample frames per chunk
    pub chunk_frames: usize,
}
