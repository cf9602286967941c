//! Decoding of compressed clips into interleaved 16-bit samples.

use super::AudioFormat;
use crate::error::{PodforgeError, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A decoded clip.
#[derive(Debug, Clone)]
pub struct DecodedClip {
    pub format: AudioFormat,
    /// Interleaved samples.
    pub samples: Vec<i16>,
}

impl DecodedClip {
    /// Number of frames (samples per channel).
    pub fn frames(&self) -> u64 {
        if self.format.channels == 0 {
            return 0;
        }
        (self.samples.len() / self.format.channels as usize) as u64
    }
}

/// Decode one clip (MP3, WAV, or any other format symphonia can probe).
///
/// Any failure is reported against `index`; a clip that yields no samples is a failure too.
pub fn decode_clip(index: usize, bytes: &[u8]) -> Result<DecodedClip> {
    let fail = |reason: String| PodforgeError::Decode { index, reason };

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| fail(format!("unrecognized audio: {}", e)))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| fail("no audio track".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| fail(format!("unsupported codec: {}", e)))?;

    let mut samples: Vec<i16> = Vec::new();
    let mut format: Option<AudioFormat> = None;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(fail(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(|e| fail(e.to_string()))?;
        let spec = *decoded.spec();
        if format.is_none() {
            format = Some(AudioFormat {
                sample_rate: spec.rate,
                channels: spec.channels.count() as u16,
                bits_per_sample: 16,
            });
        }

        let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    match format {
        Some(format) if !samples.is_empty() => Ok(DecodedClip { format, samples }),
        _ => Err(fail("no audio frames".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::wav_clip;

    #[test]
    fn test_decode_wav_clip() {
        let bytes = wav_clip(1234, 480, 24_000, 1);
        let decoded = decode_clip(0, &bytes).unwrap();

        assert_eq!(
            decoded.format,
            AudioFormat {
                sample_rate: 24_000,
                channels: 1,
                bits_per_sample: 16
            }
        );
        assert_eq!(decoded.frames(), 480);
        assert!(decoded.samples.iter().all(|s| *s == 1234));
    }

    #[test]
    fn test_decode_stereo_interleaved() {
        let bytes = wav_clip(-7, 100, 44_100, 2);
        let decoded = decode_clip(3, &bytes).unwrap();
        assert_eq!(decoded.format.channels, 2);
        assert_eq!(decoded.samples.len(), 200);
        assert_eq!(decoded.frames(), 100);
    }

    #[test]
    fn test_garbage_fails_with_index() {
        let err = decode_clip(7, b"definitely not audio").unwrap_err();
        match err {
            PodforgeError::Decode { index, .. } => assert_eq!(index, 7),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_clip_fails() {
        assert!(decode_clip(0, &[]).is_err());
        let silent = wav_clip(0, 0, 24_000, 1);
        assert!(decode_clip(1, &silent).is_err());
    }
}
