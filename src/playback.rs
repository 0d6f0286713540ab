//! Playback sink interface
//!
//! A sink accepts a locally owned sample buffer and returns a startable/
//! stoppable source handle; starting is fire-and-forget. The session keeps
//! every started source in an append-only registry so stop-all can halt
//! everything currently playing.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{ArithmusicError, Result};

/// A started playback source.
pub trait PlaybackSource {
    /// Halt the source. Stopping an already-stopped source is a no-op.
    fn stop(&mut self);
}

/// External playback collaborator.
pub trait PlaybackSink {
    /// Hand a locally owned buffer to the sink and start it.
    fn start(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        channels: u16,
    ) -> Result<Box<dyn PlaybackSource>>;
}

/// Append-only registry of started sources.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Box<dyn PlaybackSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: Box<dyn PlaybackSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Stop every source started so far.
    pub fn stop_all(&mut self) {
        for source in &mut self.sources {
            source.stop();
        }
    }
}

/// Sink that writes each buffer to a WAV file (mono or interleaved,
/// 32-bit float). The CLI's render target; "playback" is the file itself,
/// so its sources are inert.
pub struct WavFileSink {
    path: PathBuf,
}

struct WavSource;

impl PlaybackSource for WavSource {
    fn stop(&mut self) {}
}

impl WavFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlaybackSink for WavFileSink {
    fn start(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        channels: u16,
    ) -> Result<Box<dyn PlaybackSource>> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer =
            hound::WavWriter::create(&self.path, spec).map_err(|e| ArithmusicError::Playback {
                reason: e.to_string(),
            })?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| ArithmusicError::Playback {
                    reason: e.to_string(),
                })?;
        }
        writer.finalize().map_err(|e| ArithmusicError::Playback {
            reason: e.to_string(),
        })?;
        Ok(Box::new(WavSource))
    }
}

/// In-memory sink for tests: records what it was handed and how many of its
/// sources were stopped.
#[derive(Default)]
pub struct MemorySink {
    /// Buffers received, most recent last.
    pub started: Vec<(Vec<f32>, u32, u16)>,
    stop_counter: Rc<Cell<u32>>,
}

/// Source handle from [`MemorySink`]; increments the sink's shared stop
/// counter at most once.
pub struct MemorySource {
    counter: Rc<Cell<u32>>,
    stopped: bool,
}

impl PlaybackSource for MemorySource {
    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.counter.set(self.counter.get() + 1);
        }
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of sources from this sink that have been stopped.
    pub fn stopped_count(&self) -> u32 {
        self.stop_counter.get()
    }
}

impl PlaybackSink for MemorySink {
    fn start(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        channels: u16,
    ) -> Result<Box<dyn PlaybackSource>> {
        self.started.push((samples.to_vec(), sample_rate, channels));
        Ok(Box::new(MemorySource {
            counter: Rc::clone(&self.stop_counter),
            stopped: false,
        }))
    }
}
