//! Ordered concatenation of clips into one WAV track.

use super::{decode_clip, AssembledTrack, AudioClip, AudioFormat};
use crate::error::{PodforgeError, Result};
use std::io::Cursor;
use tracing::{info, instrument, warn};

/// Decode every clip, concatenate in ascending index order and encode as WAV.
///
/// Missing indices are simply absent from the track. The first clip's format is
/// used for the whole track; later clips are appended as-is. Any clip that fails
/// to decode aborts the assembly.
#[instrument(skip(clips), fields(clips = clips.len()))]
pub fn assemble(mut clips: Vec<AudioClip>) -> Result<AssembledTrack> {
    if clips.is_empty() {
        return Err(PodforgeError::Assembly("no clips to assemble".to_string()));
    }
    clips.sort_by_key(|c| c.index);

    let mut format: Option<AudioFormat> = None;
    let mut samples: Vec<i16> = Vec::new();
    let mut segments = Vec::with_capacity(clips.len());

    for clip in &clips {
        let decoded = decode_clip(clip.index, &clip.bytes)?;
        match format {
            None => format = Some(decoded.format),
            Some(canonical) if canonical != decoded.format => {
                warn!(
                    "Clip {} is {:?}, track is {:?}; appending without conversion",
                    clip.index, decoded.format, canonical
                );
            }
            Some(_) => {}
        }
        samples.extend_from_slice(&decoded.samples);
        segments.push(clip.index);
    }

    let format = format.ok_or_else(|| PodforgeError::Assembly("no clips decoded".to_string()))?;
    let wav = encode_wav(&samples, format)?;
    let frames = (samples.len() / format.channels.max(1) as usize) as u64;

    info!(
        "Assembled {} segments, {} frames at {} Hz",
        segments.len(),
        frames,
        format.sample_rate
    );

    Ok(AssembledTrack {
        wav,
        format,
        segments,
        frames,
    })
}

fn encode_wav(samples: &[i16], format: AudioFormat) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };
    let encode_err = |e: hound::Error| PodforgeError::Assembly(format!("wav encode: {}", e));

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(encode_err)?;
        for &sample in samples {
            writer.write_sample(sample).map_err(encode_err)?;
        }
        writer.finalize().map_err(encode_err)?;
    }
    Ok(cursor.into_inner())
}
