//! Key detection via template correlation
//!
//! A chroma vector is compared by cosine similarity against the 24
//! Krumhansl-Kessler key profiles. The winner is reported with its Camelot
//! wheel slot, gated by a confidence threshold that rises with how peaked
//! the chroma distribution is.

use crate::camelot::{CamelotKey, MusicalKey};
use crate::chroma::{ChromaVector, PitchClassProfiler};
use crate::error::AnalysisError;
use crate::source::SampleSource;
use tracing::debug;

/// Krumhansl-Kessler major profile, tonic at index 0
const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor profile, tonic at index 0
const MINOR_PROFILE: [f32; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 3.92, 3.53, 2.96, 4.52, 2.98,
];

/// One reference key profile with its precomputed norm
struct KeyTemplate {
    key: MusicalKey,
    weights: [f32; 12],
    norm: f32,
}

impl KeyTemplate {
    /// Rotate a tonic-rooted base profile so that entry `pc` holds the
    /// expected weight of absolute pitch class `pc` in this key
    fn rotated(key: MusicalKey, base: &[f32; 12]) -> Self {
        let tonic = key.tonic() as usize;
        let mut weights = [0.0f32; 12];
        for (pc, weight) in weights.iter_mut().enumerate() {
            *weight = base[(pc + 12 - tonic) % 12];
        }
        let norm = weights.iter().map(|w| w * w).sum::<f32>().sqrt();
        Self { key, weights, norm }
    }

    /// Cosine similarity against a chroma vector, zero when either side
    /// has no energy
    fn similarity(&self, chroma: &ChromaVector) -> f32 {
        let mut dot = 0.0f32;
        let mut chroma_norm_sq = 0.0f32;
        for (value, weight) in chroma.iter().zip(&self.weights) {
            dot += value * weight;
            chroma_norm_sq += value * value;
        }
        if chroma_norm_sq == 0.0 || self.norm == 0.0 {
            return 0.0;
        }
        dot / (chroma_norm_sq.sqrt() * self.norm)
    }
}

/// Outcome of a successful key match
#[derive(Debug, Clone, Copy)]
pub struct KeyResult {
    /// The matched key
    pub key: MusicalKey,
    /// Harmonic-mixing slot of the key
    pub camelot: CamelotKey,
    /// Cosine similarity of the winning template
    pub confidence: f32,
}

/// Matches chroma vectors against the 24 reference key templates
pub struct KeyMatcher {
    templates: Vec<KeyTemplate>,
}

impl Default for KeyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMatcher {
    /// Build the 24 templates by rotating the base profiles to each tonic
    pub fn new() -> Self {
        let mut templates = Vec::with_capacity(24);
        for tonic in 0..12u8 {
            templates.push(KeyTemplate::rotated(MusicalKey::major(tonic), &MAJOR_PROFILE));
            templates.push(KeyTemplate::rotated(MusicalKey::minor(tonic), &MINOR_PROFILE));
        }
        Self { templates }
    }

    /// Match a chroma vector against every template
    ///
    /// Fails with [`AnalysisError::LowConfidence`] when the best
    /// similarity does not clear the dynamic threshold.
    pub fn match_key(&self, chroma: &ChromaVector) -> Result<KeyResult, AnalysisError> {
        let mut best_index = 0usize;
        let mut best_similarity = f32::MIN;
        for (index, template) in self.templates.iter().enumerate() {
            let similarity = template.similarity(chroma);
            if similarity > best_similarity {
                best_similarity = similarity;
                best_index = index;
            }
        }

        let threshold = dynamic_threshold(chroma);
        if best_similarity < threshold {
            return Err(AnalysisError::LowConfidence {
                confidence: best_similarity,
                threshold,
            });
        }

        let key = self.templates[best_index].key;
        let camelot = CamelotKey::from_musical_key(key);
        debug!(%key, %camelot, confidence = best_similarity, "key matched");
        Ok(KeyResult {
            key,
            camelot,
            confidence: best_similarity,
        })
    }
}

/// Confidence gate for a chroma vector
///
/// A peaked distribution demands a better template fit: the threshold is
/// 0.1 plus half the population variance normalized by total energy,
/// clamped to [0.1, 0.5].
fn dynamic_threshold(chroma: &ChromaVector) -> f32 {
    let len = chroma.len() as f32;
    let total: f32 = chroma.iter().sum();
    if total == 0.0 {
        return 0.1;
    }
    let mean = total / len;
    let variance = chroma.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / len;
    (0.1 + variance / total * 0.5).clamp(0.1, 0.5)
}

/// Detect the musical key of a PCM stream
///
/// Profiles the stream into a chroma vector and matches it against the
/// reference templates. Silent streams fail with `InsufficientSignal`,
/// tonally ambiguous ones with `LowConfidence`.
pub fn analyze_key(
    source: &mut dyn SampleSource,
    sample_rate: u32,
) -> Result<KeyResult, AnalysisError> {
    let chroma = PitchClassProfiler::new(sample_rate).profile(source)?;
    KeyMatcher::new().match_key(&chroma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InterleavedSource;
    use std::f32::consts::PI;

    #[test]
    fn test_major_triad_matches_its_key() {
        // C, E and G active: a C major triad.
        let mut chroma = [0.0f32; 12];
        chroma[0] = 1.0 / 3.0;
        chroma[4] = 1.0 / 3.0;
        chroma[7] = 1.0 / 3.0;

        let result = KeyMatcher::new().match_key(&chroma).unwrap();
        assert_eq!(result.key, MusicalKey::major(0));
        assert_eq!(result.camelot.display(), "8B");
        assert!(
            result.confidence > 0.70 && result.confidence < 0.73,
            "confidence {}",
            result.confidence
        );
    }

    #[test]
    fn test_templates_match_themselves() {
        let matcher = KeyMatcher::new();
        for template in &matcher.templates {
            let result = matcher.match_key(&template.weights).unwrap();
            assert_eq!(result.key, template.key);
            assert!(
                (result.confidence - 1.0).abs() < 1e-5,
                "{} at {}",
                template.key,
                result.confidence
            );
        }
    }

    #[test]
    fn test_flat_chroma_has_floor_threshold() {
        let uniform = [1.0 / 12.0; 12];
        let threshold = dynamic_threshold(&uniform);
        assert!((threshold - 0.1).abs() < 1e-4, "threshold {threshold}");

        // Profiles are all-positive, so even a flat vector correlates far
        // above the floor and the match succeeds.
        let result = KeyMatcher::new().match_key(&uniform).unwrap();
        assert!(result.confidence > 0.9);
    }

    #[test]
    fn test_peaked_chroma_raises_threshold() {
        let mut spike = [0.0f32; 12];
        spike[9] = 1.0;
        let threshold = dynamic_threshold(&spike);
        assert!(threshold > 0.13 && threshold < 0.15, "threshold {threshold}");
    }

    #[test]
    fn test_zero_chroma_is_low_confidence() {
        // The profiler refuses to emit this vector, but the matcher still
        // gates it if handed one directly.
        let result = KeyMatcher::new().match_key(&[0.0; 12]);
        assert!(matches!(
            result,
            Err(AnalysisError::LowConfidence { .. })
        ));
    }

    #[test]
    fn test_analyze_key_pure_tone() {
        // A 440 Hz tone lands on pitch class A; the spike correlates best
        // with A major.
        let rate = 44100u32;
        let samples: Vec<f32> = (0..rate * 2)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / rate as f32).sin())
            .collect();
        let mut source = InterleavedSource::new(&samples, rate, 1).unwrap();
        let result = analyze_key(&mut source, rate).unwrap();
        assert_eq!(result.key, MusicalKey::major(9));
        assert_eq!(result.camelot.display(), "11B");
        assert!(result.confidence > 0.4);
    }

    #[test]
    fn test_analyze_key_silence_fails_fast() {
        let samples = vec![0.0f32; 44100];
        let mut source = InterleavedSource::new(&samples, 44100, 2).unwrap();
        assert!(matches!(
            analyze_key(&mut source, 44100),
            Err(AnalysisError::InsufficientSignal)
        ));
    }
}
