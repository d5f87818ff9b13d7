//! Energy envelope extraction
//!
//! Reduces a raw sample stream to a decimated loudness trace. An
//! asymmetric leaky integrator follows the rectified signal with a fast
//! attack and a slow release; every `interval` input samples the running
//! value is emitted as one envelope point.

/// Attack time constant in samples
const ATTACK: f64 = 8.0;
/// Release time constant in samples
const RELEASE: f64 = 512.0;

/// Incremental envelope extractor
///
/// The integrator value carries across emitted points; only the sample
/// counter resets on emission.
#[derive(Debug, Clone)]
pub struct EnvelopeExtractor {
    value: f64,
    count: u32,
    interval: u32,
}

impl EnvelopeExtractor {
    /// Create an extractor emitting one point per `interval` samples
    pub fn new(interval: u32) -> Self {
        Self {
            value: 0.0,
            count: 0,
            interval,
        }
    }

    /// Feed one sample, yielding an envelope point when a group completes
    pub fn push(&mut self, sample: f32) -> Option<f32> {
        let z = f64::from(sample).abs();
        if z > self.value {
            self.value += (z - self.value) / ATTACK;
        } else {
            self.value -= (self.value - z) / RELEASE;
        }
        self.count += 1;
        if self.count == self.interval {
            self.count = 0;
            Some(self.value as f32)
        } else {
            None
        }
    }
}

/// Extract a complete envelope from a finished buffer
///
/// Inputs shorter than `interval` yield an empty envelope.
pub fn extract(samples: &[f32], interval: u32) -> Vec<f32> {
    let mut extractor = EnvelopeExtractor::new(interval);
    let mut nrg = Vec::with_capacity(samples.len() / interval.max(1) as usize);
    for &sample in samples {
        if let Some(point) = extractor.push(sample) {
            nrg.push(point);
        }
    }
    nrg
}

/// Single-pole low-pass filter for taming noise ahead of extraction
///
/// `alpha = cutoff / (cutoff + rate)`; the first output sample is zero.
pub fn low_pass(samples: &[f32], cutoff: f64, sample_rate: u32) -> Vec<f32> {
    let alpha = (cutoff / (cutoff + f64::from(sample_rate))) as f32;
    let mut filtered = vec![0.0f32; samples.len()];
    for i in 1..samples.len() {
        filtered[i] = filtered[i - 1] + alpha * (samples[i] - filtered[i - 1]);
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_empty_envelope() {
        assert!(extract(&[], 128).is_empty());
        assert!(extract(&[0.5; 100], 128).is_empty());
    }

    #[test]
    fn test_point_count_matches_interval() {
        let nrg = extract(&[0.5; 1000], 128);
        assert_eq!(nrg.len(), 1000 / 128);
    }

    #[test]
    fn test_converges_to_constant_amplitude() {
        // A few multiples of the attack constant is plenty to settle.
        let nrg = extract(&[0.8; 2048], 128);
        let last = *nrg.last().unwrap();
        assert!((last - 0.8).abs() < 1e-3, "settled at {last}");
    }

    #[test]
    fn test_silence_stays_at_zero() {
        let nrg = extract(&[0.0; 2048], 128);
        assert!(nrg.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_release_decays_slowly() {
        let mut extractor = EnvelopeExtractor::new(64);
        let mut points = Vec::new();
        for _ in 0..256 {
            if let Some(p) = extractor.push(1.0) {
                points.push(p);
            }
        }
        for _ in 0..256 {
            if let Some(p) = extractor.push(0.0) {
                points.push(p);
            }
        }
        let peak = points[3];
        let after = *points.last().unwrap();
        // Decaying but nowhere near silent after half a release constant.
        assert!(after < peak);
        assert!(after > peak * 0.3);
    }

    #[test]
    fn test_incremental_matches_batch() {
        let samples: Vec<f32> = (0..4096)
            .map(|i| ((i as f32) * 0.01).sin() * 0.5)
            .collect();
        let batch = extract(&samples, 128);

        let mut extractor = EnvelopeExtractor::new(128);
        let mut incremental = Vec::new();
        for &s in &samples {
            if let Some(p) = extractor.push(s) {
                incremental.push(p);
            }
        }
        assert_eq!(batch, incremental);
    }

    #[test]
    fn test_low_pass_tracks_dc() {
        let filtered = low_pass(&[1.0; 4000], 2000.0, 44100);
        assert_eq!(filtered[0], 0.0);
        assert!(*filtered.last().unwrap() > 0.95);
        // Monotone rise toward the input level.
        assert!(filtered.windows(2).all(|w| w[1] >= w[0]));
    }
}
