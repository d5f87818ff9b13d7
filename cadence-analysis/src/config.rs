//! Analysis configuration
//!
//! Every tunable travels in one immutable value handed to each analysis
//! call. Concurrent analyses with different settings never interfere.

use crate::error::AnalysisError;

/// Parameters for one tempo analysis
///
/// The decimation interval is independent of the sample rate, so BPM
/// estimates taken at different rates are not directly comparable without
/// explicit rescaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Sample rate of the incoming PCM in Hz
    pub sample_rate: u32,
    /// Input sample frames folded into one envelope point
    pub decimation_interval: u32,
    /// Lower bound of the BPM search range
    pub slowest_bpm: f64,
    /// Upper bound of the BPM search range
    pub fastest_bpm: f64,
    /// Coarse search steps across the lag range
    pub steps: u32,
    /// Score multiplier kept for compatibility with tuned thresholds
    pub repeats: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            decimation_interval: 128,
            slowest_bpm: 120.0,
            fastest_bpm: 200.0,
            steps: 1024,
            repeats: 1024,
        }
    }
}

impl AnalysisConfig {
    /// Check the configuration invariants
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.sample_rate == 0 {
            return Err(AnalysisError::InvalidConfig("sample_rate must be positive"));
        }
        if self.decimation_interval == 0 {
            return Err(AnalysisError::InvalidConfig(
                "decimation_interval must be positive",
            ));
        }
        if self.slowest_bpm <= 0.0 {
            return Err(AnalysisError::InvalidConfig("slowest_bpm must be positive"));
        }
        if self.slowest_bpm >= self.fastest_bpm {
            return Err(AnalysisError::InvalidConfig(
                "slowest_bpm must be below fastest_bpm",
            ));
        }
        if self.steps == 0 {
            return Err(AnalysisError::InvalidConfig("steps must be positive"));
        }
        if self.repeats == 0 {
            return Err(AnalysisError::InvalidConfig("repeats must be positive"));
        }
        Ok(())
    }

    /// Envelope points produced per second of audio
    pub fn points_per_second(&self) -> u32 {
        self.sample_rate / self.decimation_interval
    }
}
