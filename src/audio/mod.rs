//! Audio clips and their assembly into a single track.

mod assemble;
mod decode;

pub use assemble::assemble;
pub use decode::{decode_clip, DecodedClip};

use serde::Serialize;

/// Compressed audio for one dialogue line, tagged with the line's index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub index: usize,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn new(index: usize, bytes: Vec<u8>) -> Self {
        Self { index, bytes }
    }
}

/// Sample rate, channel count and bit depth shared by a whole track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

/// The final WAV track.
#[derive(Debug, Clone)]
pub struct AssembledTrack {
    /// Encoded WAV bytes.
    pub wav: Vec<u8>,
    pub format: AudioFormat,
    /// Clip indices in the order they were concatenated.
    pub segments: Vec<usize>,
    /// Total frames (samples per channel).
    pub frames: u64,
}

impl AssembledTrack {
    /// Track length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.format.sample_rate as f64
    }
}
