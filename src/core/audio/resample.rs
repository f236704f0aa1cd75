//! Sample-rate and channel-layout reconciliation using rubato.

use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use super::buffer::AudioBuffer;
use crate::errors::{SpeechError, SpeechResult};

const CHUNK_FRAMES: usize = 1024;

/// Converts `buffer` to the given sample rate and channel count.
pub fn reconcile(buffer: AudioBuffer, sample_rate: u32, channels: u16) -> SpeechResult<AudioBuffer> {
    let buffer = convert_channels(buffer, channels);
    if buffer.sample_rate == sample_rate {
        return Ok(buffer);
    }
    resample(&buffer, sample_rate)
}

/// Remaps the channel layout: downmix to mono, duplicate mono, or wrap
/// source channels onto the target layout.
pub fn convert_channels(buffer: AudioBuffer, channels: u16) -> AudioBuffer {
    let channels = channels.max(1);
    if buffer.channels == channels {
        return buffer;
    }
    if channels == 1 {
        return AudioBuffer::new(buffer.mono_mix(), buffer.sample_rate, 1);
    }

    let source = buffer.deinterleave();
    let planes: Vec<Vec<f32>> = (0..usize::from(channels))
        .map(|i| source[i % source.len()].clone())
        .collect();
    AudioBuffer::interleave(&planes, buffer.sample_rate)
}

/// Resamples every channel to `target_rate`.
///
/// Output length is `round(frames * target_rate / source_rate)`; the
/// resampler's startup delay is trimmed.
pub fn resample(buffer: &AudioBuffer, target_rate: u32) -> SpeechResult<AudioBuffer> {
    if buffer.sample_rate == target_rate || buffer.is_empty() {
        return Ok(AudioBuffer::new(
            buffer.samples.clone(),
            target_rate,
            buffer.channels,
        ));
    }
    if buffer.sample_rate == 0 || target_rate == 0 {
        return Err(SpeechError::DecodeError(format!(
            "Cannot resample from {} Hz to {target_rate} Hz",
            buffer.sample_rate
        )));
    }

    let ratio = f64::from(target_rate) / f64::from(buffer.sample_rate);
    let planes = buffer.deinterleave();
    let channels = planes.len();
    let frames = buffer.frames();
    let expected = (frames as f64 * ratio).round() as usize;

    let mut resampler =
        FastFixedIn::<f32>::new(ratio, 1.0, PolynomialDegree::Cubic, CHUNK_FRAMES, channels)
            .map_err(|e| SpeechError::DecodeError(format!("Failed to create resampler: {e}")))?;
    let delay = resampler.output_delay();

    let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels];
    let append = |out: &mut Vec<Vec<f32>>, produced: Vec<Vec<f32>>| {
        for (plane, chunk) in out.iter_mut().zip(produced) {
            plane.extend_from_slice(&chunk);
        }
    };
    let resample_err = |e: rubato::ResampleError| SpeechError::DecodeError(format!("Resampling failed: {e}"));

    let mut pos = 0usize;
    loop {
        let need = resampler.input_frames_next();
        if pos + need > frames {
            break;
        }
        let chunk: Vec<&[f32]> = planes.iter().map(|p| &p[pos..pos + need]).collect();
        let produced = resampler.process(chunk.as_slice(), None).map_err(resample_err)?;
        append(&mut out, produced);
        pos += need;
    }

    if pos < frames {
        let chunk: Vec<&[f32]> = planes.iter().map(|p| &p[pos..]).collect();
        let produced = resampler
            .process_partial(Some(chunk.as_slice()), None)
            .map_err(resample_err)?;
        append(&mut out, produced);
    }

    // Flush the tail held back by the resampler delay
    while out[0].len() < expected + delay {
        let produced = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(resample_err)?;
        if produced.first().is_none_or(Vec::is_empty) {
            break;
        }
        append(&mut out, produced);
    }

    for plane in &mut out {
        plane.drain(..delay.min(plane.len()));
        plane.resize(expected, 0.0);
    }

    Ok(AudioBuffer::interleave(&out, target_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frames: usize, rate: u32, channels: u16) -> AudioBuffer {
        let samples = (0..frames)
            .flat_map(|n| {
                let v = (2.0 * std::f32::consts::PI * 440.0 * n as f32 / rate as f32).sin() * 0.5;
                std::iter::repeat_n(v, usize::from(channels))
            })
            .collect();
        AudioBuffer::new(samples, rate, channels)
    }

    #[test]
    fn test_resample_length() {
        let input = sine(24_000, 24_000, 1);
        let output = resample(&input, 16_000).unwrap();
        assert_eq!(output.sample_rate, 16_000);
        assert_eq!(output.frames(), 16_000);

        let output = resample(&sine(22_050, 22_050, 2), 44_100).unwrap();
        assert_eq!(output.channels, 2);
        assert_eq!(output.frames(), 44_100);
    }

    #[test]
    fn test_resample_preserves_level() {
        let input = sine(48_000, 48_000, 1);
        let output = resample(&input, 24_000).unwrap();
        let mid = &output.samples[2_000..22_000];
        let peak = mid.iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.05, "peak {peak}");
    }

    #[test]
    fn test_same_rate_is_identity() {
        let input = sine(100, 16_000, 1);
        assert_eq!(resample(&input, 16_000).unwrap(), input);
    }

    #[test]
    fn test_convert_channels() {
        let stereo = AudioBuffer::new(vec![0.2, 0.4, -0.2, -0.4], 8_000, 2);
        let mono = convert_channels(stereo, 1);
        assert_eq!(mono.channels, 1);
        assert_eq!(mono.frames(), 2);
        assert!((mono.samples[0] - 0.3).abs() < 1e-6);

        let back = convert_channels(mono, 2);
        assert_eq!(back.channels, 2);
        assert_eq!(back.samples[0], back.samples[1]);
    }

    #[test]
    fn test_reconcile_both() {
        let input = sine(8_000, 8_000, 2);
        let output = reconcile(input, 16_000, 1).unwrap();
        assert_eq!(output.channels, 1);
        assert_eq!(output.sample_rate, 16_000);
        assert_eq!(output.frames(), 16_000);
    }
}
