//! Audio resampling using rubato
//!
//! Converts decoded source audio to the output device's sample rate.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Stereo resampler using rubato.
pub struct Resampler;

impl Resampler {
    /// Resample interleaved stereo audio from `input_rate` to `output_rate`.
    ///
    /// Returns a copy without resampling when the rates already match.
    pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
        if input_rate == output_rate {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(input.to_vec());
        }
        if input_rate == 0 || output_rate == 0 {
            return Err(Error::Decode(format!(
                "Invalid sample rates: {}Hz -> {}Hz",
                input_rate, output_rate
            )));
        }

        debug!("Resampling from {}Hz to {}Hz", input_rate, output_rate);

        let planar_input = Self::deinterleave(input);
        let input_frames = planar_input[0].len();
        if input_frames == 0 {
            return Ok(Vec::new());
        }

        // Whole source in one chunk; ratio is fixed for the life of the resampler
        let mut resampler = FastFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            1.0,
            PolynomialDegree::Septic,
            input_frames,
            2,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        let planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        let output = Self::interleave(&planar_output);

        debug!(
            "Resampled {} input frames to {} output frames",
            input_frames,
            output.len() / 2
        );

        Ok(output)
    }

    /// [L, R, L, R, ...] -> [[L, L, ...], [R, R, ...]]
    fn deinterleave(samples: &[f32]) -> Vec<Vec<f32>> {
        let (left, right): (Vec<f32>, Vec<f32>) = samples
            .chunks_exact(2)
            .map(|frame| (frame[0], frame[1]))
            .unzip();
        vec![left, right]
    }

    /// [[L, L, ...], [R, R, ...]] -> [L, R, L, R, ...]
    fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
        match planar {
            [left, right, ..] => left
                .iter()
                .zip(right.iter())
                .flat_map(|(&l, &r)| [l, r])
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let planar = Resampler::deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]);
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_interleave() {
        let planar = vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]];
        assert_eq!(
            Resampler::interleave(&planar),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_resample_same_rate() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        let output = Resampler::resample(&input, 48000, 48000).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_resample_different_rate() {
        let input_rate = 48000;
        let frames = 4800;

        let mut input = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            let t = i as f32 / input_rate as f32;
            let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
            input.push(sample);
            input.push(sample);
        }

        let output = Resampler::resample(&input, input_rate, 44100).unwrap();

        let expected_frames = (frames as f64 * 44100.0 / input_rate as f64) as usize;
        let output_frames = output.len() / 2;
        assert!(
            output_frames + 10 >= expected_frames && output_frames <= expected_frames + 10,
            "Expected ~{} frames, got {}",
            expected_frames,
            output_frames
        );
    }
}
