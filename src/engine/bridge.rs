//! Synthesis Bridge
//!
//! Drives the foreign engine through one render round-trip at a time:
//! request, buffer-ready, copy-out, release. The bridge owns the engine and
//! is the only constructor of [`ForeignBuffer`] handles, and a handle is
//! consumed by the one copy-out-and-release operation, so a result region
//! can never be read after release or released twice. A second request while
//! one is outstanding is rejected with `Busy`; the engine exposes a single
//! result slot and requests must never interleave.

use tracing::{debug, warn};

use crate::error::{ArithmusicError, Result};

use super::api::SynthesisEngine;

/// Which output the engine is asked for. Both kinds share the request and
/// buffer-lifecycle protocol; only the interpretation of the samples differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// Raw mono waveform samples.
    Waveform,
    /// Flattened time/frequency magnitude frames.
    Spectrogram,
}

impl RenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderKind::Waveform => "waveform",
            RenderKind::Spectrogram => "spectrogram",
        }
    }
}

/// An owned reference to a result region inside the engine's heap.
///
/// Constructible only by the bridge's request path. Not `Clone`; the only
/// operations are the consuming copy-out-and-release and the consuming
/// discard, so double release and use-after-release are unrepresentable.
#[derive(Debug)]
pub struct ForeignBuffer {
    ptr: u32,
    len: u32,
}

impl ForeignBuffer {
    /// Copy the samples into locally owned storage, then release the region.
    /// Consumes the handle; the foreign pointer is never held past this call.
    fn copy_and_release<E: SynthesisEngine>(self, engine: &mut E) -> Vec<f32> {
        let start = self.ptr as usize;
        let end = start + self.len as usize * 4;
        // Bounds were checked when the descriptor was accepted.
        let bytes = &engine.heap_memory()[start..end];
        let samples = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        engine.dealloc(self.ptr, self.len);
        samples
    }

    /// Release the region without copying (error-path cleanup).
    fn release<E: SynthesisEngine>(self, engine: &mut E) {
        engine.dealloc(self.ptr, self.len);
    }
}

enum Phase {
    Idle,
    BufferReady(ForeignBuffer),
}

/// Locally owned result of one render round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAudio {
    /// How the samples are to be interpreted.
    pub kind: RenderKind,
    /// The copied-out samples; owned by this side of the boundary.
    pub samples: Vec<f32>,
}

/// Single-flight driver for one synthesis engine.
pub struct SynthesisBridge<E: SynthesisEngine> {
    engine: E,
    phase: Phase,
}

impl<E: SynthesisEngine> SynthesisBridge<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            phase: Phase::Idle,
        }
    }

    /// Whether a request's result is still outstanding.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Read access to the wrapped engine (its mutable surface stays behind
    /// the bridge).
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// One full render round-trip: request, copy-out, release.
    pub fn render(
        &mut self,
        kind: RenderKind,
        composition_doc: &str,
        settings_doc: &str,
    ) -> Result<RenderedAudio> {
        self.request(kind, composition_doc, settings_doc)?;
        self.take_rendered(kind)
    }

    /// Hand the serialized composition and settings to the engine and accept
    /// its buffer descriptor.
    ///
    /// Fails with `Busy` when a result is already outstanding, and with
    /// `Engine` when the call fails or the descriptor does not describe a
    /// readable region of the heap (in which case there is no buffer to
    /// release and the bridge stays idle).
    pub fn request(
        &mut self,
        kind: RenderKind,
        composition_doc: &str,
        settings_doc: &str,
    ) -> Result<()> {
        if !self.is_idle() {
            warn!(kind = kind.as_str(), "synthesis rejected: request in flight");
            return Err(ArithmusicError::Busy);
        }

        debug!(kind = kind.as_str(), "synthesis requested");
        let outcome = match kind {
            RenderKind::Waveform => self
                .engine
                .synthesize_composition(composition_doc, settings_doc),
            RenderKind::Spectrogram => self
                .engine
                .synthesize_spectrogram(composition_doc, settings_doc),
        };
        outcome.map_err(|e| ArithmusicError::Engine {
            reason: e.to_string(),
        })?;

        let ptr = self.engine.audio_buffer_ptr();
        let len = self.engine.audio_buffer_len();
        self.check_descriptor(ptr, len)?;

        debug!(ptr, len, "buffer ready");
        self.phase = Phase::BufferReady(ForeignBuffer { ptr, len });
        Ok(())
    }

    /// Copy the outstanding buffer out of the engine heap, release it, and
    /// return to idle. Fails with `Engine` when no render is outstanding.
    pub fn take_rendered(&mut self, kind: RenderKind) -> Result<RenderedAudio> {
        let buffer = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::BufferReady(buffer) => buffer,
            Phase::Idle => {
                return Err(ArithmusicError::Engine {
                    reason: "no render outstanding".to_string(),
                })
            }
        };

        let samples = buffer.copy_and_release(&mut self.engine);
        debug!(samples = samples.len(), "buffer copied out and released");
        Ok(RenderedAudio { kind, samples })
    }

    /// Release an outstanding buffer without copying it, returning the
    /// bridge to idle. No-op when idle.
    pub fn discard(&mut self) {
        if let Phase::BufferReady(buffer) = std::mem::replace(&mut self.phase, Phase::Idle) {
            warn!("outstanding render buffer discarded without copy-out");
            buffer.release(&mut self.engine);
        }
    }

    fn check_descriptor(&self, ptr: u32, len: u32) -> Result<()> {
        let heap_len = self.engine.heap_memory().len();
        let end = ptr as usize + len as usize * 4;
        if len == 0 || ptr % 4 != 0 || end > heap_len {
            return Err(ArithmusicError::Engine {
                reason: format!(
                    "invalid buffer descriptor: ptr={ptr} len={len} heap={heap_len}"
                ),
            });
        }
        Ok(())
    }
}

impl<E: SynthesisEngine> Drop for SynthesisBridge<E> {
    fn drop(&mut self) {
        // A buffer still outstanding at teardown is released, not leaked.
        self.discard();
    }
}
