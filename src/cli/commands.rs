//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::composition::CompositionStore;
use crate::document::ProjectFile;
use crate::engine::NativeEngine;
use crate::error::Result;
use crate::playback::{MemorySink, PlaybackSink, WavFileSink};
use crate::session::Session;
use crate::validate::validate;

/// Write a seed composition project file.
pub fn demo(path: &Path) -> Result<()> {
    info!("Writing seed project to: {}", path.display());

    let store = CompositionStore::with_seed();
    ProjectFile::snapshot(store.composition())?.save_to(path)?;

    println!("Project written: {}", path.display());
    Ok(())
}

/// Validate a project file's composition and report the result.
pub fn check(path: &Path) -> Result<()> {
    info!("Validating project: {}", path.display());

    let composition = ProjectFile::load_from(path)?.into_composition()?;
    match validate(&composition) {
        None => {
            println!("Composition is synthesizable");
        }
        Some(report) => {
            println!("Composition has {} problem(s):", report.len());
            for error in &report.errors {
                println!("  - {error}");
            }
        }
    }
    Ok(())
}

/// Render a project to a WAV file through the reference engine.
pub fn render(path: &Path, output: &Path) -> Result<()> {
    info!(
        "Rendering project {} to {}",
        path.display(),
        output.display()
    );

    let mut session = load_session(path, WavFileSink::new(output))?;
    let samples = session.play()?;

    println!("Rendered {} samples to {}", samples, output.display());
    Ok(())
}

/// Render spectral data for a project and print its shape.
pub fn spectrogram(path: &Path) -> Result<()> {
    info!("Rendering spectrogram for: {}", path.display());

    let mut session = load_session(path, MemorySink::new())?;
    let rendered = session.render_spectrogram()?;

    println!("Spectrogram: {} values", rendered.samples.len());
    Ok(())
}

/// Print a summary of a project file.
pub fn show_info(path: &Path) -> Result<()> {
    let file = ProjectFile::load_from(path)?;
    println!("Project: {}", path.display());
    println!("Saved at: {}", file.saved_at);
    println!("Checksum: {}", file.checksum);

    let composition = file.into_composition()?;
    println!("Timelines: {}", composition.timelines.len());
    println!("Segments: {}", composition.segment_count());
    println!(
        "Settings: fs={} volume={} multiplier={} aliasing={}",
        composition.settings.fs,
        composition.settings.volume,
        composition.settings.multiplier,
        composition.settings.aliasing
    );
    Ok(())
}

fn load_session<S: PlaybackSink>(path: &Path, sink: S) -> Result<Session<NativeEngine, S>> {
    let mut session = Session::with_store(CompositionStore::new(), NativeEngine::new(), sink);
    session.load_project(path)?;
    Ok(session)
}
