//! Editor session
//!
//! Ties the composition store, the synthesis bridge, and the playback sink
//! together into the flows the UI triggers: play, stop-all, spectrogram,
//! save/load, and the named-key modal visibility map. All of it runs on one
//! logical thread; the synthesis call is the lone suspension point and the
//! bridge enforces single-flight.

use std::path::Path;

use tracing::info;

use crate::composition::CompositionStore;
use crate::document::{export_composition_json, export_settings_json, ProjectFile};
use crate::engine::{RenderKind, RenderedAudio, SynthesisBridge, SynthesisEngine};
use crate::error::{ArithmusicError, Result};
use crate::playback::{PlaybackSink, SourceRegistry};
use crate::validate::{validate, ErrorReport};

/// Named keys of the modal visibility map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Load,
    Save,
    Settings,
    Alert,
}

/// Visibility of each modal dialog. The dialogs themselves are external
/// collaborators; this core only owns the open/closed flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModalState {
    load: bool,
    save: bool,
    settings: bool,
    alert: bool,
}

impl ModalState {
    fn flag(&mut self, kind: ModalKind) -> &mut bool {
        match kind {
            ModalKind::Load => &mut self.load,
            ModalKind::Save => &mut self.save,
            ModalKind::Settings => &mut self.settings,
            ModalKind::Alert => &mut self.alert,
        }
    }

    pub fn toggle(&mut self, kind: ModalKind) {
        let flag = self.flag(kind);
        *flag = !*flag;
    }

    pub fn open(&mut self, kind: ModalKind) {
        *self.flag(kind) = true;
    }

    pub fn close(&mut self, kind: ModalKind) {
        *self.flag(kind) = false;
    }

    pub fn is_open(&self, kind: ModalKind) -> bool {
        match kind {
            ModalKind::Load => self.load,
            ModalKind::Save => self.save,
            ModalKind::Settings => self.settings,
            ModalKind::Alert => self.alert,
        }
    }
}

/// One editing session over a synthesis engine and a playback sink.
pub struct Session<E: SynthesisEngine, S: PlaybackSink> {
    store: CompositionStore,
    bridge: SynthesisBridge<E>,
    sink: S,
    sources: SourceRegistry,
    modals: ModalState,
    last_errors: Option<ErrorReport>,
}

impl<E: SynthesisEngine, S: PlaybackSink> Session<E, S> {
    /// Start a session with the editor's seed composition.
    pub fn new(engine: E, sink: S) -> Self {
        Self::with_store(CompositionStore::with_seed(), engine, sink)
    }

    pub fn with_store(store: CompositionStore, engine: E, sink: S) -> Self {
        Self {
            store,
            bridge: SynthesisBridge::new(engine),
            sink,
            sources: SourceRegistry::new(),
            modals: ModalState::default(),
            last_errors: None,
        }
    }

    /// The composition store; all edits go through it.
    pub fn store(&self) -> &CompositionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CompositionStore {
        &mut self.store
    }

    /// Current revision of the composition (redraw trigger).
    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    /// Read access to the synthesis engine behind the bridge.
    pub fn engine(&self) -> &E {
        self.bridge.engine()
    }

    /// Read access to the playback sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The validation report from the last refused synthesis, for the alert
    /// modal.
    pub fn last_errors(&self) -> Option<&ErrorReport> {
        self.last_errors.as_ref()
    }

    /// Number of playback sources started so far.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn toggle_modal(&mut self, kind: ModalKind) {
        self.modals.toggle(kind);
    }

    pub fn modal_open(&self, kind: ModalKind) -> bool {
        self.modals.is_open(kind)
    }

    /// Validate, synthesize, and hand the result to the playback sink.
    ///
    /// A composition with structural errors is refused before the engine is
    /// touched: the report is kept for the alert modal, the alert flag is
    /// raised, and a `Validation` error is returned. Returns the number of
    /// samples rendered.
    pub fn play(&mut self) -> Result<usize> {
        if let Some(report) = validate(self.store.composition()) {
            self.last_errors = Some(report.clone());
            self.modals.open(ModalKind::Alert);
            return Err(ArithmusicError::Validation { report });
        }
        self.last_errors = None;

        let rendered = self.render(RenderKind::Waveform)?;
        let sample_rate = self.store.composition().settings.fs.round() as u32;
        let source = self.sink.start(&rendered.samples, sample_rate, 1)?;
        self.sources.push(source);

        info!(
            samples = rendered.samples.len(),
            sample_rate, "composition playing"
        );
        Ok(rendered.samples.len())
    }

    /// Stop every source started during this session.
    pub fn stop_all(&mut self) {
        self.sources.stop_all();
    }

    /// Render spectral data for the current composition. Shares the play
    /// path's validation gate and buffer lifecycle.
    pub fn render_spectrogram(&mut self) -> Result<RenderedAudio> {
        if let Some(report) = validate(self.store.composition()) {
            self.last_errors = Some(report.clone());
            return Err(ArithmusicError::Validation { report });
        }
        self.render(RenderKind::Spectrogram)
    }

    fn render(&mut self, kind: RenderKind) -> Result<RenderedAudio> {
        let composition_doc = export_composition_json(self.store.composition())?;
        let settings_doc = export_settings_json(&self.store.composition().settings)?;
        self.bridge.render(kind, &composition_doc, &settings_doc)
    }

    /// Write the current composition to a project file.
    pub fn save_project(&self, path: &Path) -> Result<()> {
        ProjectFile::snapshot(self.store.composition())?.save_to(path)
    }

    /// Replace the current composition from a project file. A malformed or
    /// corrupt file aborts the load and leaves the composition untouched.
    pub fn load_project(&mut self, path: &Path) -> Result<()> {
        let loaded = ProjectFile::load_from(path)?.into_composition()?;
        self.store.load_composition(loaded)
    }
}
