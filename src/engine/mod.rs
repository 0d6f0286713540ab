//! Synthesis Engine Module
//!
//! The foreign engine surface, the bridge that drives it, and an in-process
//! reference engine:
//! - `api`: the consumed engine interface (serialized request in, buffer
//!   descriptor out, explicit dealloc)
//! - `bridge`: single-flight request state machine and buffer lifecycle
//! - `native`: reference engine backing the CLI and end-to-end tests

pub mod api;
pub mod bridge;
pub mod native;

pub use api::SynthesisEngine;
pub use bridge::{RenderKind, RenderedAudio, SynthesisBridge};
pub use native::NativeEngine;
