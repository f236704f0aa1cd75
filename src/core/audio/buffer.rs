//! Decoded PCM audio.

use std::time::Duration;

/// Interleaved `f32` samples in `[-1.0, 1.0]` with their format.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Silence of `duration_ms`, rounded to the nearest frame.
    pub fn silence(duration_ms: u32, sample_rate: u32, channels: u16) -> Self {
        let frames = frames_for_ms(duration_ms, sample_rate);
        Self::new(vec![0.0; frames * usize::from(channels.max(1))], sample_rate, channels)
    }

    /// Number of sample frames (one sample per channel).
    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Appends `other`, which must share this buffer's format.
    pub fn append(&mut self, other: &AudioBuffer) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        debug_assert_eq!(self.channels, other.channels);
        self.samples.extend_from_slice(&other.samples);
    }

    /// Splits interleaved samples into one vector per channel.
    pub fn deinterleave(&self) -> Vec<Vec<f32>> {
        let channels = usize::from(self.channels);
        let mut planes = vec![Vec::with_capacity(self.frames()); channels];
        for frame in self.samples.chunks_exact(channels) {
            for (plane, sample) in planes.iter_mut().zip(frame) {
                plane.push(*sample);
            }
        }
        planes
    }

    /// Builds a buffer from per-channel planes of equal length.
    pub fn interleave(planes: &[Vec<f32>], sample_rate: u32) -> Self {
        let channels = planes.len().max(1);
        let frames = planes.iter().map(Vec::len).min().unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            for plane in planes {
                samples.push(plane[i]);
            }
        }
        Self::new(samples, sample_rate, channels as u16)
    }

    /// Average of all channels per frame.
    pub fn mono_mix(&self) -> Vec<f32> {
        let channels = usize::from(self.channels);
        if channels == 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

/// Frames in `duration_ms` at `sample_rate`, rounded to nearest.
#[inline]
pub fn frames_for_ms(duration_ms: u32, sample_rate: u32) -> usize {
    ((u64::from(duration_ms) * u64::from(sample_rate) + 500) / 1000) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_length() {
        let silence = AudioBuffer::silence(800, 22_050, 1);
        assert_eq!(silence.frames(), 17_640);
        assert!(silence.samples.iter().all(|s| *s == 0.0));

        let stereo = AudioBuffer::silence(10, 48_000, 2);
        assert_eq!(stereo.frames(), 480);
        assert_eq!(stereo.samples.len(), 960);
    }

    #[test]
    fn test_deinterleave_round_trip() {
        let buffer = AudioBuffer::new(vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3], 16_000, 2);
        let planes = buffer.deinterleave();
        assert_eq!(planes[0], vec![0.1, 0.2, 0.3]);
        assert_eq!(planes[1], vec![-0.1, -0.2, -0.3]);
        assert_eq!(AudioBuffer::interleave(&planes, 16_000), buffer);
    }

    #[test]
    fn test_peak_and_mono_mix() {
        let buffer = AudioBuffer::new(vec![0.5, -0.9, 0.1, 0.3], 8_000, 2);
        assert_eq!(buffer.peak(), 0.9);
        let mono = buffer.mono_mix();
        assert!((mono[0] + 0.2).abs() < 1e-6);
        assert!((mono[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::silence(1_500, 10_000, 1);
        assert_eq!(buffer.duration(), Duration::from_millis(1_500));
    }
}
