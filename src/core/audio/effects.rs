//! Segment assembly: decode, reconcile, tempo, gain, silence, normalize, encode.

use bytes::Bytes;
use tracing::debug;

use super::buffer::{AudioBuffer, frames_for_ms};
use super::codec::{OutputFormat, decode, encode};
use super::resample::reconcile;
use super::stretch::time_stretch;
use crate::core::emotion::EmotionProfile;
use crate::core::text::TextSegment;
use crate::errors::{SpeechError, SpeechResult};

/// Peak ceiling of the assembled track, in dBFS.
pub const TARGET_PEAK_DBFS: f32 = -1.0;

/// Converts decibels to a linear amplitude factor.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Scales every sample by `gain_db`, clipping to `[-1.0, 1.0]`.
pub fn apply_gain(buffer: &mut AudioBuffer, gain_db: f32) {
    if gain_db == 0.0 {
        return;
    }
    let factor = db_to_linear(gain_db);
    for sample in &mut buffer.samples {
        *sample = (*sample * factor).clamp(-1.0, 1.0);
    }
}

/// Scales the buffer so its peak equals `target_peak`. Silence is left alone.
pub fn normalize_peak(buffer: &mut AudioBuffer, target_peak: f32) {
    let peak = buffer.peak();
    if peak <= f32::EPSILON {
        return;
    }
    let scale = target_peak / peak;
    for sample in &mut buffer.samples {
        *sample = (*sample * scale).clamp(-target_peak, target_peak);
    }
}

/// Silence inserted after segment `index`, or `None` for the last one.
pub fn pause_after(segments: &[TextSegment], index: usize, profile: &EmotionProfile) -> Option<u32> {
    let next = segments.get(index + 1)?;
    let base = if segments[index].sentence_terminal {
        profile.sentence_pause_ms
    } else {
        profile.clause_pause_ms
    };
    let emphasis = if next.has_emphasis() {
        profile.emphasis_pause_ms
    } else {
        0
    };
    Some(base.saturating_add(emphasis))
}

/// Turns per-segment synthesized audio into one continuous track.
#[derive(Debug, Clone)]
pub struct AudioEffectsEngine {
    target_peak: f32,
}

impl Default for AudioEffectsEngine {
    fn default() -> Self {
        Self {
            target_peak: db_to_linear(TARGET_PEAK_DBFS),
        }
    }
}

impl AudioEffectsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Linear peak ceiling applied by normalization.
    #[inline]
    pub fn target_peak(&self) -> f32 {
        self.target_peak
    }

    /// Assembles and encodes the final track.
    ///
    /// `segment_audios[i]` must be the synthesized audio of `segments[i]`.
    /// Any failure fails the whole assembly; no partial track is returned.
    pub fn assemble(
        &self,
        segment_audios: &[Bytes],
        segments: &[TextSegment],
        profile: &EmotionProfile,
        format: OutputFormat,
    ) -> SpeechResult<Bytes> {
        let track = self.render(segment_audios, segments, profile)?;
        encode(&track, format)
    }

    /// Assembles the track as PCM without encoding it.
    pub fn render(
        &self,
        segment_audios: &[Bytes],
        segments: &[TextSegment],
        profile: &EmotionProfile,
    ) -> SpeechResult<AudioBuffer> {
        if segment_audios.len() != segments.len() {
            return Err(SpeechError::InvalidConfiguration(format!(
                "{} audio buffers for {} segments",
                segment_audios.len(),
                segments.len()
            )));
        }
        if segments.is_empty() {
            return Err(SpeechError::EmptyInput);
        }

        let decoded = segment_audios
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                decode(bytes).map_err(|e| match e {
                    SpeechError::DecodeError(msg) => {
                        SpeechError::DecodeError(format!("segment {i}: {msg}"))
                    }
                    other => other,
                })
            })
            .collect::<SpeechResult<Vec<_>>>()?;

        let (sample_rate, channels) = (decoded[0].sample_rate, decoded[0].channels);
        let mut track = AudioBuffer::new(Vec::new(), sample_rate, channels);

        for (index, buffer) in decoded.into_iter().enumerate() {
            let buffer = reconcile(buffer, sample_rate, channels)?;
            let mut buffer = time_stretch(&buffer, profile.tempo_multiplier);
            apply_gain(&mut buffer, profile.gain_delta_db);
            track.append(&buffer);

            if let Some(pause_ms) = pause_after(segments, index, profile) {
                let frames = frames_for_ms(pause_ms, sample_rate);
                track
                    .samples
                    .resize(track.samples.len() + frames * usize::from(channels), 0.0);
            }
        }

        normalize_peak(&mut track, self.target_peak);

        debug!(
            segments = segments.len(),
            sample_rate,
            channels,
            frames = track.frames(),
            "Assembled audio track"
        );
        Ok(track)
    }
}
