//! Pitch-preserving tempo change (WSOLA).
//!
//! Waveform-similarity overlap-add: Hann-windowed frames are read from the
//! input at `tempo` times the output hop, each nudged within a small
//! tolerance to the position that best continues the previous frame, then
//! overlap-added. Duration changes, pitch does not.
//!
//! Offsets are chosen on the mono mix and applied to every channel so the
//! stereo image stays coherent.

use super::buffer::AudioBuffer;

const WINDOW_MS: f32 = 20.0;
const MIN_WINDOW: usize = 32;

/// Output frame count for `frames` input frames at `tempo`.
#[inline]
pub fn stretched_len(frames: usize, tempo: f32) -> usize {
    if frames == 0 {
        return 0;
    }
    ((frames as f64 / f64::from(tempo)).round() as usize).max(1)
}

/// Changes the duration of `buffer` by `1 / tempo` without changing pitch.
///
/// The result always has exactly [`stretched_len`] frames.
pub fn time_stretch(buffer: &AudioBuffer, tempo: f32) -> AudioBuffer {
    let frames = buffer.frames();
    if frames == 0 || !tempo.is_finite() || tempo <= 0.0 || (tempo - 1.0).abs() < 1e-6 {
        return buffer.clone();
    }
    let target = stretched_len(frames, tempo);

    let window = (((buffer.sample_rate as f32 * WINDOW_MS / 1000.0) as usize).max(MIN_WINDOW)) & !1;
    if frames < window * 2 {
        return linear_stretch(buffer, target);
    }

    let hop_out = window / 2;
    let hop_in = hop_out as f64 * f64::from(tempo);
    let tolerance = window / 4;
    let hann: Vec<f32> = (0..window)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / window as f32).cos())
        .collect();

    let mono = buffer.mono_mix();
    let planes = buffer.deinterleave();
    let mut out = vec![vec![0.0f32; target + window]; planes.len()];
    let mut norm = vec![0.0f32; target + window];

    let mut prev: Option<usize> = None;
    let mut k = 0usize;
    while k * hop_out < target {
        let out_pos = k * hop_out;
        let nominal = (k as f64 * hop_in).round() as usize;
        let pos = match prev {
            Some(p) if p + hop_out < frames => {
                best_offset(&mono, p + hop_out, nominal, tolerance, hop_out)
            }
            _ => nominal,
        };

        for (plane, dst) in planes.iter().zip(out.iter_mut()) {
            for (i, w) in hann.iter().enumerate() {
                if let Some(sample) = plane.get(pos + i) {
                    dst[out_pos + i] += sample * w;
                }
            }
        }
        for (i, w) in hann.iter().enumerate() {
            norm[out_pos + i] += w;
        }

        prev = Some(pos);
        k += 1;
    }

    for plane in &mut out {
        for (sample, w) in plane.iter_mut().zip(&norm) {
            if *w > 1e-2 {
                *sample /= w;
            }
        }
        plane.truncate(target);
    }

    AudioBuffer::interleave(&out, buffer.sample_rate)
}

/// Position within `nominal ± tolerance` whose first `span` samples best
/// match the natural continuation starting at `natural`.
fn best_offset(mono: &[f32], natural: usize, nominal: usize, tolerance: usize, span: usize) -> usize {
    let start = nominal.saturating_sub(tolerance);
    let end = (nominal + tolerance).min(mono.len().saturating_sub(1));
    if start >= end {
        return nominal;
    }

    let reference = &mono[natural..(natural + span).min(mono.len())];
    let mut best = nominal;
    let mut best_score = f32::NEG_INFINITY;
    for candidate in start..=end {
        let score: f32 = reference
            .iter()
            .zip(&mono[candidate..])
            .map(|(a, b)| a * b)
            .sum();
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}

/// Linear-interpolation fallback for buffers shorter than two windows.
fn linear_stretch(buffer: &AudioBuffer, target: usize) -> AudioBuffer {
    let frames = buffer.frames();
    let planes = buffer.deinterleave();
    let step = if target > 1 {
        (frames - 1) as f64 / (target - 1) as f64
    } else {
        0.0
    };

    let stretched: Vec<Vec<f32>> = planes
        .iter()
        .map(|plane| {
            (0..target)
                .map(|i| {
                    let src = i as f64 * step;
                    let idx = src.floor() as usize;
                    let frac = (src - idx as f64) as f32;
                    let a = plane[idx.min(frames - 1)];
                    let b = plane[(idx + 1).min(frames - 1)];
                    a + (b - a) * frac
                })
                .collect()
        })
        .collect();

    AudioBuffer::interleave(&stretched, buffer.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, frames: usize, rate: u32) -> AudioBuffer {
        let samples = (0..frames)
            .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / rate as f32).sin() * 0.5)
            .collect();
        AudioBuffer::new(samples, rate, 1)
    }

    /// Dominant period estimated from upward zero crossings.
    fn zero_crossing_rate(samples: &[f32]) -> f32 {
        let crossings = samples
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
            .count();
        crossings as f32 / samples.len() as f32
    }

    #[test]
    fn test_unity_tempo_is_identity() {
        let input = sine(220.0, 4_000, 16_000);
        assert_eq!(time_stretch(&input, 1.0), input);
    }

    #[test]
    fn test_output_length() {
        let input = sine(220.0, 16_000, 16_000);
        assert_eq!(time_stretch(&input, 0.8).frames(), 20_000);
        assert_eq!(time_stretch(&input, 1.25).frames(), 12_800);
        assert_eq!(time_stretch(&input, 1.18).frames(), stretched_len(16_000, 1.18));
    }

    #[test]
    fn test_pitch_preserved() {
        let input = sine(300.0, 32_000, 16_000);
        let slow = time_stretch(&input, 0.75);
        let fast = time_stretch(&input, 1.3);

        let reference = zero_crossing_rate(&input.samples);
        for output in [slow, fast] {
            let rate = zero_crossing_rate(&output.samples[1_000..output.samples.len() - 1_000]);
            assert!(
                (rate - reference).abs() / reference < 0.05,
                "zero-crossing rate {rate} vs {reference}"
            );
        }
    }

    #[test]
    fn test_stereo_channels_stay_aligned() {
        let mono = sine(200.0, 8_000, 16_000);
        let stereo = AudioBuffer::interleave(&[mono.samples.clone(), mono.samples.clone()], 16_000);
        let out = time_stretch(&stereo, 0.9);
        assert_eq!(out.channels, 2);
        for frame in out.samples.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_short_buffer_fallback() {
        let input = AudioBuffer::new(vec![0.0, 1.0, 0.0, -1.0], 16_000, 1);
        let out = time_stretch(&input, 0.5);
        assert_eq!(out.frames(), 8);
        assert!(out.peak() <= 1.0);
    }
}
