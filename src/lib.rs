//! Arithmusic - Composition Editor Core
//!
//! Arithmusic builds a musical composition out of timelines of segments and
//! drives an external synthesis engine to render it to an audio buffer.
//!
//! # Architecture
//!
//! - Composition store: timelines, segments, settings, selection, identity
//!   counters, revision counter, operation log
//! - Validator: structural error reporting that gates synthesis
//! - Serialization layer: canonical wire documents and the project file
//! - Synthesis bridge: single-flight foreign engine round-trips with
//!   copy-out-then-release buffer lifecycle
//! - Session: the editor flows (play, stop, spectrogram, save/load)

pub mod cli;
pub mod composition;
pub mod document;
pub mod engine;
pub mod error;
pub mod playback;
pub mod session;
pub mod validate;

pub use error::{ArithmusicError, Result};
