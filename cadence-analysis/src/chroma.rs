//! Pitch-class profiling
//!
//! Builds a 12-bin chroma vector from a PCM stream. Each block of 1024
//! frames is downmixed to mono, Hann-windowed and transformed; the
//! dominant spectral peak maps to a pitch class, and the per-class counts
//! are normalized into a distribution over the whole stream.

use crate::error::AnalysisError;
use crate::source::SampleSource;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;
use tracing::trace;

/// Stereo frames per analysis block
pub const FRAME_SIZE: usize = 1024;

/// A normalized 12-bin pitch-class distribution (0 = C .. 11 = B)
pub type ChromaVector = [f32; 12];

/// Chroma extractor with a preplanned FFT and window
pub struct PitchClassProfiler {
    sample_rate: u32,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Pre-allocated FFT buffer (reused per block to avoid allocation)
    fft_buffer: Vec<Complex<f32>>,
}

impl PitchClassProfiler {
    /// Create a profiler for streams at the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FRAME_SIZE);

        // Pre-compute Hann window
        let window: Vec<f32> = (0..FRAME_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / FRAME_SIZE as f32).cos()))
            .collect();

        Self {
            sample_rate,
            fft,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); FRAME_SIZE],
        }
    }

    /// Profile an entire stream into a chroma vector
    ///
    /// Fails with [`AnalysisError::InsufficientSignal`] when no block
    /// carries a detectable frequency, as with silence or pure DC.
    pub fn profile(
        &mut self,
        source: &mut dyn SampleSource,
    ) -> Result<ChromaVector, AnalysisError> {
        let mut frames = [[0.0f32; 2]; FRAME_SIZE];
        let mut histogram = [0.0f32; 12];
        let mut blocks = 0usize;

        loop {
            let n = source.next_frame(&mut frames);
            if n == 0 {
                break;
            }
            let frequency = self.dominant_frequency(&frames[..n]);
            if frequency > 0.0 {
                histogram[pitch_class(frequency)] += 1.0;
            }
            blocks += 1;
        }
        trace!(blocks, "pitch-class profile complete");

        let total: f32 = histogram.iter().sum();
        if total == 0.0 {
            return Err(AnalysisError::InsufficientSignal);
        }
        for bin in &mut histogram {
            *bin /= total;
        }
        Ok(histogram)
    }

    /// Dominant frequency of one block via the FFT magnitude peak, in Hz
    ///
    /// Zero means no peak rose above the DC bin.
    fn dominant_frequency(&mut self, frames: &[[f32; 2]]) -> f32 {
        // Downmix and window; a short trailing block is zero-padded.
        for i in 0..FRAME_SIZE {
            let mono = match frames.get(i) {
                Some(frame) => (frame[0] + frame[1]) / 2.0,
                None => 0.0,
            };
            self.fft_buffer[i] = Complex::new(mono * self.window[i], 0.0);
        }
        self.fft.process(&mut self.fft_buffer);

        // Peak over the lower half of the spectrum. Strict comparison
        // keeps index 0 only when nothing above DC rises at all.
        let mut peak = 0usize;
        let mut peak_magnitude = self.fft_buffer[0].norm();
        for (i, coefficient) in self.fft_buffer[..FRAME_SIZE / 2].iter().enumerate().skip(1) {
            let magnitude = coefficient.norm();
            if magnitude > peak_magnitude {
                peak = i;
                peak_magnitude = magnitude;
            }
        }
        peak as f32 * self.sample_rate as f32 / FRAME_SIZE as f32
    }
}

/// Pitch class (0 = C) of a frequency in Hz
fn pitch_class(frequency: f32) -> usize {
    let note = ((frequency / 440.0).log2() * 12.0 + 69.0).round() as i32;
    ((note % 12 + 12) % 12) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InterleavedSource;

    fn sine(frequency: f32, seconds: f32, rate: u32) -> Vec<f32> {
        let total = (seconds * rate as f32) as usize;
        (0..total)
            .map(|i| (2.0 * PI * frequency * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_pitch_class_of_reference_notes() {
        assert_eq!(pitch_class(440.0), 9); // A4
        assert_eq!(pitch_class(880.0), 9); // octave invariant
        assert_eq!(pitch_class(261.63), 0); // C4
        assert_eq!(pitch_class(110.0), 9); // A2, below the reference
        assert_eq!(pitch_class(392.0), 7); // G4
    }

    #[test]
    fn test_pure_tone_concentrates_on_one_class() {
        let samples = sine(440.0, 2.0, 44100);
        let mut source = InterleavedSource::new(&samples, 44100, 1).unwrap();
        let chroma = PitchClassProfiler::new(44100).profile(&mut source).unwrap();

        let sum: f32 = chroma.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "sum {sum}");
        assert!(chroma.iter().all(|&v| v >= 0.0));

        let argmax = (0..12).max_by(|&a, &b| chroma[a].total_cmp(&chroma[b])).unwrap();
        assert_eq!(argmax, 9, "chroma {chroma:?}");
        assert!(chroma[9] > 0.9);
    }

    #[test]
    fn test_silence_is_insufficient_signal() {
        let samples = vec![0.0f32; 44100];
        let mut source = InterleavedSource::new(&samples, 44100, 2).unwrap();
        let result = PitchClassProfiler::new(44100).profile(&mut source);
        assert!(matches!(result, Err(AnalysisError::InsufficientSignal)));
    }

    #[test]
    fn test_dc_only_is_insufficient_signal() {
        // Constant offset has all its energy in bin 0, which never counts.
        let samples = vec![0.7f32; 44100];
        let mut source = InterleavedSource::new(&samples, 44100, 1).unwrap();
        let result = PitchClassProfiler::new(44100).profile(&mut source);
        assert!(matches!(result, Err(AnalysisError::InsufficientSignal)));
    }
}
