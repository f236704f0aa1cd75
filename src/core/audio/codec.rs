//! Container decoding and encoding.
//!
//! WAV input goes through `hound`; anything else (the MP3 that speech
//! endpoints usually return) is probed and decoded with `symphonia`.

use std::fmt;
use std::io::Cursor;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::AudioBuffer;
use crate::errors::{SpeechError, SpeechResult};

// =============================================================================
// Output Format
// =============================================================================

/// Encoded output containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// 16-bit PCM in a RIFF/WAVE container
    #[default]
    Wav,
    /// Headerless 16-bit little-endian PCM
    Pcm16,
}

impl OutputFormat {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Pcm16 => "pcm16",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "wav" | "wave" => Some(OutputFormat::Wav),
            "pcm16" | "pcm" | "raw" | "linear16" => Some(OutputFormat::Pcm16),
            _ => None,
        }
    }

    /// MIME type of the encoded bytes.
    #[inline]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "audio/wav",
            OutputFormat::Pcm16 => "audio/pcm",
        }
    }

    /// Conventional file extension.
    #[inline]
    pub const fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Pcm16 => "pcm",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes one segment's bytes into PCM.
///
/// # Errors
///
/// `DecodeError` when the bytes are not audio or contain no samples.
pub fn decode(bytes: &Bytes) -> SpeechResult<AudioBuffer> {
    let buffer = if is_wav(bytes) {
        decode_wav(bytes)?
    } else {
        decode_with_symphonia(bytes)?
    };

    if buffer.is_empty() || buffer.sample_rate == 0 {
        return Err(SpeechError::DecodeError(
            "Audio contains no samples".to_string(),
        ));
    }
    Ok(buffer)
}

#[inline]
fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

fn decode_wav(bytes: &Bytes) -> SpeechResult<AudioBuffer> {
    let reader = hound::WavReader::new(Cursor::new(&bytes[..]))
        .map_err(|e| SpeechError::DecodeError(format!("Invalid WAV: {e}")))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| SpeechError::DecodeError(format!("Invalid WAV samples: {e}")))?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<_, _>>()
                .map_err(|e| SpeechError::DecodeError(format!("Invalid WAV samples: {e}")))?
        }
    };

    Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
}

fn decode_with_symphonia(bytes: &Bytes) -> SpeechResult<AudioBuffer> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.clone())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| SpeechError::DecodeError(format!("Unrecognized audio format: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SpeechError::DecodeError("No audio track found".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SpeechError::DecodeError(format!("Unsupported codec: {e}")))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(1);
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(SpeechError::DecodeError(format!("Error reading packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let needs_new = sample_buf
                    .as_ref()
                    .is_none_or(|buf| buf.capacity() < decoded.capacity() * spec.channels.count());
                if needs_new {
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            // Skip corrupt frames
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(SpeechError::DecodeError(format!("Decode failed: {e}"))),
        }
    }

    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

// =============================================================================
// Encoding
// =============================================================================

#[inline]
fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}

/// Encodes PCM into `format`.
pub fn encode(buffer: &AudioBuffer, format: OutputFormat) -> SpeechResult<Bytes> {
    match format {
        OutputFormat::Wav => encode_wav(buffer),
        OutputFormat::Pcm16 => {
            let mut out = Vec::with_capacity(buffer.samples.len() * 2);
            for sample in &buffer.samples {
                out.extend_from_slice(&quantize(*sample).to_le_bytes());
            }
            Ok(Bytes::from(out))
        }
    }
}

fn encode_wav(buffer: &AudioBuffer) -> SpeechResult<Bytes> {
    let spec = hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + buffer.samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| SpeechError::EncodeError(format!("WAV header: {e}")))?;
    for sample in &buffer.samples {
        writer
            .write_sample(quantize(*sample))
            .map_err(|e| SpeechError::EncodeError(format!("WAV samples: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| SpeechError::EncodeError(format!("WAV finalize: {e}")))?;

    Ok(Bytes::from(cursor.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, channels: u16) -> AudioBuffer {
        let samples = (0..frames * usize::from(channels))
            .map(|i| (i as f32 / 100.0).sin() * 0.5)
            .collect();
        AudioBuffer::new(samples, 16_000, channels)
    }

    #[test]
    fn test_wav_encode_then_decode() {
        let original = ramp(1_000, 2);
        let bytes = encode(&original, OutputFormat::Wav).unwrap();
        let decoded = decode(&bytes).unwrap();

        assert_eq!(decoded.sample_rate, 16_000);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.frames(), 1_000);
        for (a, b) in original.samples.iter().zip(&decoded.samples) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_pcm16_layout() {
        let buffer = AudioBuffer::new(vec![1.0, -1.0, 0.0, 2.0], 8_000, 1);
        let bytes = encode(&buffer, OutputFormat::Pcm16).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), -i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), 0);
        // Out-of-range input is clamped, never wrapped
        assert_eq!(i16::from_le_bytes([bytes[6], bytes[7]]), i16::MAX);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let bytes = Bytes::from_static(b"this is definitely not audio data");
        assert!(matches!(decode(&bytes), Err(SpeechError::DecodeError(_))));
    }

    #[test]
    fn test_truncated_wav_is_decode_error() {
        let bytes = Bytes::from_static(b"RIFF\x24\x00\x00\x00WAVEfmt ");
        assert!(matches!(decode(&bytes), Err(SpeechError::DecodeError(_))));
    }

    #[test]
    fn test_empty_wav_is_decode_error() {
        let empty = AudioBuffer::new(Vec::new(), 16_000, 1);
        let bytes = encode(&empty, OutputFormat::Wav).unwrap();
        assert!(matches!(decode(&bytes), Err(SpeechError::DecodeError(_))));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str("WAV"), Some(OutputFormat::Wav));
        assert_eq!(OutputFormat::from_str("pcm"), Some(OutputFormat::Pcm16));
        assert_eq!(OutputFormat::from_str("mp3"), None);
        assert_eq!(OutputFormat::Pcm16.mime_type(), "audio/pcm");
    }
}
