//! Streaming analysis pipeline for Cadence
//!
//! Wraps the envelope extractor and tempo scanner of `cadence-analysis`
//! in a concurrent producer/consumer pair connected by a bounded channel,
//! so tempo can be computed incrementally on live or very large inputs.

mod pipeline;

pub use pipeline::{analyze_tempo, analyze_tempo_progressive, PipelineError, ProgressiveTempo};
