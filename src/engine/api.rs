//! Foreign synthesis engine interface
//!
//! The engine is separately compiled and opaque; this trait is its consumed
//! surface, one method per exported call. The engine renders into its own
//! linear memory and reports the result as a pointer/length pair; the caller
//! must copy the samples out and then release the region exactly once via
//! [`dealloc`](SynthesisEngine::dealloc). Go through
//! [`SynthesisBridge`](crate::engine::SynthesisBridge) rather than driving
//! this trait directly; the bridge makes the lifecycle misuse-proof.

use crate::error::Result;

/// The consumed synthesis engine surface.
pub trait SynthesisEngine {
    /// Render a waveform for the given composition and settings documents.
    /// The result is retrieved through the buffer accessors afterwards.
    fn synthesize_composition(&mut self, composition: &str, settings: &str) -> Result<()>;

    /// Render time/frequency data instead of a waveform. Same result
    /// protocol as [`synthesize_composition`](Self::synthesize_composition).
    fn synthesize_spectrogram(&mut self, composition: &str, settings: &str) -> Result<()>;

    /// Byte offset of the most recent result within the engine heap.
    fn audio_buffer_ptr(&self) -> u32;

    /// Length of the most recent result in f32 samples.
    fn audio_buffer_len(&self) -> u32;

    /// The engine's linear memory; the buffer descriptor points into this.
    fn heap_memory(&self) -> &[u8];

    /// Release a result region. Must be called exactly once per successful
    /// render, after copy-out; the pointer is dangling afterwards.
    fn dealloc(&mut self, ptr: u32, len: u32);
}
