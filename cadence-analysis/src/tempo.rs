//! Tempo estimation over an energy envelope
//!
//! An autodifference scan: a candidate beat period scores well when the
//! envelope deviates little from its center value at harmonically related
//! offsets. The lag range covering the configured BPM bounds is searched
//! coarse-to-fine and the minimum-score lag wins.

use crate::config::AnalysisConfig;
use rayon::prelude::*;
use tracing::debug;

/// Signed harmonic multiples of the candidate lag sampled when scoring
const HARMONICS: [f64; 12] = [
    -32.0, -16.0, -8.0, -4.0, -2.0, -1.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0,
];

/// Scans an energy envelope for the best-fitting beat period
#[derive(Debug, Clone, Copy)]
pub struct TempoScanner {
    config: AnalysisConfig,
}

impl TempoScanner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Convert a BPM value to its envelope-domain lag
    pub fn bpm_to_lag(&self, bpm: f64) -> f64 {
        f64::from(self.config.sample_rate) / (bpm / 60.0)
            / f64::from(self.config.decimation_interval)
    }

    /// Convert an envelope-domain lag back to BPM
    pub fn lag_to_bpm(&self, lag: f64) -> f64 {
        f64::from(self.config.sample_rate) / (lag * f64::from(self.config.decimation_interval))
            * 60.0
    }

    /// Estimate the tempo of an envelope in BPM
    ///
    /// There is no failure path: an empty or very short envelope scores
    /// every candidate identically and deterministically resolves to the
    /// fastest bound. Callers wanting a meaningful estimate should supply
    /// several seconds of audio.
    pub fn scan(&self, nrg: &[f32]) -> f32 {
        let coarse_step = (self.bpm_to_lag(self.config.slowest_bpm)
            - self.bpm_to_lag(self.config.fastest_bpm))
            / f64::from(self.config.steps);
        let refined_step = coarse_step / 10.0;

        let mut best_lag = 0.0;
        let mut best_score = f64::INFINITY;

        // Coarse pass across the whole lag range. Ascending order plus
        // strict comparison means the first minimum wins ties.
        let mut lag = self.bpm_to_lag(self.config.fastest_bpm);
        let end = self.bpm_to_lag(self.config.slowest_bpm);
        while lag <= end {
            let score = self.score(nrg, lag);
            if score < best_score {
                best_score = score;
                best_lag = lag;
            }
            lag += coarse_step;
        }

        // Refine around the coarse winner; its score stays as the bar.
        let mut lag = best_lag - refined_step;
        let end = best_lag + refined_step;
        while lag <= end {
            let score = self.score(nrg, lag);
            if score < best_score {
                best_score = score;
                best_lag = lag;
            }
            lag += refined_step;
        }

        let bpm = self.lag_to_bpm(best_lag) as f32;
        debug!(bpm, best_lag, "tempo scan complete");
        bpm
    }

    /// Score one candidate lag, lower is better
    ///
    /// The twelve harmonic offsets are independent reads of the shared
    /// envelope, computed as a parallel join. `repeats` scales the
    /// deterministic sum.
    fn score(&self, nrg: &[f32], lag: f64) -> f64 {
        let center = nrg.len() as f64 / 2.0;
        let anchor = sample(nrg, center);
        let diff: f64 = HARMONICS
            .par_iter()
            .map(|&m| (sample(nrg, center + m * lag) - anchor).abs() / m.abs())
            .sum();
        diff * f64::from(self.config.repeats)
    }
}

/// Envelope value at a fractional offset: nearest lower index, zero
/// outside the envelope
fn sample(nrg: &[f32], offset: f64) -> f64 {
    let i = offset.floor();
    if i >= 0.0 && (i as usize) < nrg.len() {
        f64::from(nrg[i as usize])
    } else {
        0.0
    }
}
