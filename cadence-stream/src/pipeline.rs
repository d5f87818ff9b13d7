//! Producer/consumer tempo pipeline
//!
//! The producer thread turns raw frames into envelope points and pushes
//! them through a bounded handoff; the consumer side either gathers one
//! envelope for a single scan (batch) or scans fixed-duration chunks as
//! they fill (progressive). Channel disconnection doubles as the
//! end-of-stream signal in both directions, so abandoning either side
//! shuts the pipeline down cooperatively.

use cadence_analysis::{
    AnalysisConfig, AnalysisError, EnvelopeExtractor, SampleSource, TempoScanner,
};
use crossbeam_channel::{bounded, Receiver};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, trace};

/// Capacity of the envelope-point handoff between producer and consumer
const HANDOFF_CAPACITY: usize = 256;

/// Frames pulled from the source per producer iteration
const READ_BLOCK: usize = 1024;

/// Errors from pipeline construction and analysis
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("chunk duration must cover at least one envelope point")]
    InvalidChunk,
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Envelope points covering `seconds` of audio at the configured rates
fn chunk_len(config: &AnalysisConfig, seconds: u32) -> usize {
    config.points_per_second() as usize * seconds as usize
}

/// Spawn the producer thread feeding envelope points into a bounded
/// channel
///
/// The producer blocks whenever the handoff is full and exits when the
/// source runs dry or the receiving side goes away.
fn spawn_producer<S>(
    mut source: S,
    config: AnalysisConfig,
    capacity: usize,
) -> (Receiver<f32>, JoinHandle<()>)
where
    S: SampleSource + Send + 'static,
{
    let (tx, rx) = bounded(capacity);
    let handle = thread::spawn(move || {
        let mut extractor = EnvelopeExtractor::new(config.decimation_interval);
        let mut frames = [[0.0f32; 2]; READ_BLOCK];
        loop {
            let n = source.next_frame(&mut frames);
            if n == 0 {
                break;
            }
            for frame in &frames[..n] {
                let mono = (frame[0] + frame[1]) / 2.0;
                if let Some(point) = extractor.push(mono) {
                    if tx.send(point).is_err() {
                        return;
                    }
                }
            }
        }
    });
    (rx, handle)
}

/// Estimate the tempo of an entire stream
///
/// The producer runs concurrently with this call; every envelope point,
/// including those of a trailing partial chunk, goes into one buffer that
/// is scanned once the source is exhausted.
pub fn analyze_tempo<S>(source: S, config: &AnalysisConfig) -> Result<f32, PipelineError>
where
    S: SampleSource + Send + 'static,
{
    config.validate()?;
    let (points, producer) = spawn_producer(source, *config, HANDOFF_CAPACITY);

    let mut nrg = Vec::new();
    for point in points {
        nrg.push(point);
    }
    // The channel only disconnects once the producer is done.
    let _ = producer.join();

    debug!(points = nrg.len(), "batch envelope collected");
    Ok(TempoScanner::new(*config).scan(&nrg))
}

/// Estimate tempo progressively over fixed-duration chunks
///
/// Returns a lazy iterator yielding one BPM estimate per full chunk of
/// `chunk_seconds` of audio, in stream order. A partial chunk left over
/// at end of stream is discarded. Dropping the iterator abandons the
/// pipeline; both worker threads exit through channel disconnection.
pub fn analyze_tempo_progressive<S>(
    source: S,
    config: &AnalysisConfig,
    chunk_seconds: u32,
) -> Result<ProgressiveTempo, PipelineError>
where
    S: SampleSource + Send + 'static,
{
    config.validate()?;
    let chunk = chunk_len(config, chunk_seconds);
    if chunk == 0 {
        return Err(PipelineError::InvalidChunk);
    }

    let config = *config;
    let (points, producer) = spawn_producer(source, config, HANDOFF_CAPACITY);
    let (bpm_tx, bpm_rx) = bounded(1);

    let consumer = thread::spawn(move || {
        let scanner = TempoScanner::new(config);
        let mut nrg = Vec::with_capacity(chunk);
        for point in points {
            nrg.push(point);
            if nrg.len() == chunk {
                let bpm = scanner.scan(&nrg);
                trace!(bpm, "progressive chunk scanned");
                if bpm_tx.send(bpm).is_err() {
                    return;
                }
                nrg.clear();
            }
        }
        // Whatever is left never filled a chunk and is dropped.
    });

    Ok(ProgressiveTempo {
        estimates: bpm_rx,
        workers: vec![producer, consumer],
    })
}

/// Lazy sequence of progressive BPM estimates
///
/// Finite and not restartable; iteration ends when the source is
/// exhausted.
pub struct ProgressiveTempo {
    estimates: Receiver<f32>,
    workers: Vec<JoinHandle<()>>,
}

impl Iterator for ProgressiveTempo {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.estimates.recv().ok()
    }
}

impl Drop for ProgressiveTempo {
    fn drop(&mut self) {
        // Disconnect first so a blocked worker sees the hangup, then join.
        self.estimates = crossbeam_channel::never();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
