//! Offline deterministic backend.
//!
//! Renders each segment as a sine tone whose length is proportional to the
//! number of characters. Identical input always yields identical bytes.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;

use super::SynthesisClient;
use crate::errors::{SpeechError, SpeechResult};

/// Tone generator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneConfig {
    pub sample_rate: u32,
    /// Duration contributed by each character
    pub ms_per_char: u32,
    /// Extra duration factor applied when the slow hint is set
    pub slow_factor: f32,
    /// Peak amplitude (0.0 - 1.0)
    pub amplitude: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            ms_per_char: 60,
            slow_factor: 1.5,
            amplitude: 0.5,
        }
    }
}

/// Deterministic WAV-producing backend for development and tests.
#[derive(Debug, Clone, Default)]
pub struct ToneSynthesizer {
    config: ToneConfig,
}

impl ToneSynthesizer {
    pub fn new(config: ToneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToneConfig {
        &self.config
    }

    /// Number of frames rendered for `text`.
    pub fn frames_for(&self, text: &str, slow: bool) -> usize {
        let chars = text.chars().count().max(1) as u64;
        let mut frames = chars * u64::from(self.config.ms_per_char) * u64::from(self.config.sample_rate) / 1000;
        if slow {
            frames = (frames as f64 * f64::from(self.config.slow_factor)).round() as u64;
        }
        frames as usize
    }

    fn render(&self, text: &str, language: &str, slow: bool) -> SpeechResult<Vec<u8>> {
        let frames = self.frames_for(text, slow);
        let seed = text
            .bytes()
            .chain(language.bytes())
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        let frequency = 180.0 + (seed % 320) as f32;
        let sample_rate = self.config.sample_rate as f32;
        let fade = (self.config.sample_rate / 200) as usize;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::with_capacity(44 + frames * 2));
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| SpeechError::EncodeError(format!("Tone WAV header: {e}")))?;

        for n in 0..frames {
            let envelope = if n < fade {
                n as f32 / fade as f32
            } else if frames - n < fade {
                (frames - n) as f32 / fade as f32
            } else {
                1.0
            };
            let phase = 2.0 * std::f32::consts::PI * frequency * n as f32 / sample_rate;
            let sample = phase.sin() * self.config.amplitude * envelope;
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .map_err(|e| SpeechError::EncodeError(format!("Tone WAV sample: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| SpeechError::EncodeError(format!("Tone WAV finalize: {e}")))?;

        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl SynthesisClient for ToneSynthesizer {
    async fn synthesize(&self, text: &str, language: &str, slow: bool) -> SpeechResult<Bytes> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyInput);
        }
        self.render(text, language, slow).map(Bytes::from)
    }

    fn name(&self) -> &'static str {
        "tone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duration_proportional_to_text() {
        let tone = ToneSynthesizer::default();
        let short = tone.synthesize("Hi.", "en", false).await.unwrap();
        let long = tone.synthesize("Hello there.", "en", false).await.unwrap();

        let short = hound::WavReader::new(Cursor::new(short.to_vec())).unwrap();
        let long = hound::WavReader::new(Cursor::new(long.to_vec())).unwrap();
        assert_eq!(short.duration() as usize, tone.frames_for("Hi.", false));
        assert_eq!(long.duration() as usize, 4 * short.duration() as usize);
    }

    #[tokio::test]
    async fn test_deterministic_output() {
        let tone = ToneSynthesizer::default();
        let a = tone.synthesize("Same text", "en", false).await.unwrap();
        let b = tone.synthesize("Same text", "en", false).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_slow_hint_lengthens_output() {
        let tone = ToneSynthesizer::default();
        assert!(tone.frames_for("abc", true) > tone.frames_for("abc", false));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let tone = ToneSynthesizer::default();
        assert_eq!(
            tone.synthesize("  ", "en", false).await,
            Err(SpeechError::EmptyInput)
        );
    }
}
