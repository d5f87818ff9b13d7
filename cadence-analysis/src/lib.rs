//! Audio analysis engine for Cadence
//!
//! Estimates two properties of decoded PCM: tempo, via an energy-envelope
//! autodifference scan, and musical key, via pitch-class profiling matched
//! against reference key templates. Decoding, playback and any front end
//! live elsewhere; everything here is pure computation over supplied
//! samples.

mod camelot;
mod chroma;
mod config;
mod envelope;
mod error;
mod key;
mod source;
mod tempo;

pub use camelot::{CamelotKey, MusicalKey};
pub use chroma::{ChromaVector, PitchClassProfiler, FRAME_SIZE};
pub use config::AnalysisConfig;
pub use envelope::{extract, low_pass, EnvelopeExtractor};
pub use error::AnalysisError;
pub use key::{analyze_key, KeyMatcher, KeyResult};
pub use source::{InterleavedSource, SampleSource};
pub use tempo::TempoScanner;
