//! Error taxonomy for analysis operations

use thiserror::Error;

/// Errors surfaced by the analysis engine
///
/// None of these are retried internally; callers decide whether to try
/// again with different parameters or a longer sample window.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
    #[error("no usable signal detected in stream")]
    InsufficientSignal,
    #[error("low confidence in key detection ({confidence:.3} below threshold {threshold:.3})")]
    LowConfidence { confidence: f32, threshold: f32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
