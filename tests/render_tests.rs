//! Synthesis Round-Trip Tests
//!
//! End-to-end: composition store -> wire documents -> bridge -> engine ->
//! copied-out buffer -> playback sink, with the buffer lifecycle and
//! single-flight guarantees observed from outside.

use approx::assert_relative_eq;

use arithmusic::composition::{CompositionStore, SettingsChange, TrackOption};
use arithmusic::document::{export_composition_json, export_settings_json};
use arithmusic::engine::{NativeEngine, RenderKind, SynthesisBridge, SynthesisEngine};
use arithmusic::playback::MemorySink;
use arithmusic::session::Session;

fn seed_session() -> Session<NativeEngine, MemorySink> {
    Session::new(NativeEngine::new(), MemorySink::new())
}

#[test]
fn one_second_composition_renders_fs_samples_and_releases_once() {
    let mut session = seed_session();

    let samples = session.play().expect("valid composition renders");

    // duration * fs = 1.0 * 44100
    assert_eq!(samples, 44100);
    // Exactly one release followed the copy-out: nothing left live.
    assert_eq!(session.engine().live_allocations(), 0);
}

#[test]
fn rendered_sine_matches_expected_samples() {
    let mut session = seed_session();
    session.play().unwrap();

    let (samples, sample_rate, channels) = {
        let started = &session.sink().started;
        assert_eq!(started.len(), 1);
        started[0].clone()
    };
    assert_eq!(sample_rate, 44100);
    assert_eq!(channels, 1);

    // Seed segment: 440 Hz sine, amplitude 1, volume 1.
    for &i in &[1usize, 100, 1000] {
        let t = i as f64 / 44100.0;
        let expected = (2.0 * std::f64::consts::PI * 440.0 * t).sin() as f32;
        assert_relative_eq!(samples[i], expected, epsilon = 1e-5);
    }
}

#[test]
fn negative_fs_blocks_synthesis_before_the_engine() {
    let mut session = seed_session();
    session
        .store_mut()
        .settings_change(SettingsChange::Fs(-1.0));

    let err = session.play().unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    // The engine was never asked to render.
    assert_eq!(session.engine().heap_memory().len(), 0);
}

#[test]
fn second_request_without_awaiting_first_is_busy() {
    let mut store = CompositionStore::with_seed();
    store.settings_change(SettingsChange::Volume(0.5));
    let comp = export_composition_json(store.composition()).unwrap();
    let settings = export_settings_json(&store.composition().settings).unwrap();

    let mut bridge = SynthesisBridge::new(NativeEngine::new());
    bridge
        .request(RenderKind::Waveform, &comp, &settings)
        .expect("first request");

    let err = bridge
        .request(RenderKind::Waveform, &comp, &settings)
        .unwrap_err();
    assert_eq!(err.error_code(), "BUSY");

    // The first request completes normally and releases its buffer.
    let rendered = bridge.take_rendered(RenderKind::Waveform).unwrap();
    assert_eq!(rendered.samples.len(), 44100);
    assert!(bridge.is_idle());
    assert_eq!(bridge.engine().live_allocations(), 0);
}

#[test]
fn spectrogram_shares_the_buffer_lifecycle() {
    let mut session = seed_session();

    let rendered = session.render_spectrogram().expect("spectral render");
    assert_eq!(rendered.kind, RenderKind::Spectrogram);
    assert!(!rendered.samples.is_empty());
    assert_eq!(session.engine().live_allocations(), 0);

    // A waveform render afterwards works on the same engine.
    assert_eq!(session.play().unwrap(), 44100);
    assert_eq!(session.engine().live_allocations(), 0);
}

#[test]
fn muted_and_gain_tracks_mix_as_configured() {
    let mut session = seed_session();
    let store = session.store_mut();
    let quiet = store.add_track();
    store.add_segment(quiet, 0.0, 1.0).unwrap();
    store
        .track_option_change(quiet, TrackOption::Gain(0.5))
        .unwrap();
    store.settings_change(SettingsChange::Volume(0.5));

    session.play().unwrap();
    let (samples, _, _) = session.sink().started[0].clone();

    // Two identical 440 Hz sines, gains 1.0 + 0.5, volume 0.5, clamped.
    let t = 100.0 / 44100.0;
    let expected = ((2.0 * std::f64::consts::PI * 440.0 * t).sin() * 1.5 * 0.5)
        .clamp(-1.0, 1.0) as f32;
    assert_relative_eq!(samples[100], expected, epsilon = 1e-5);
}

#[test]
fn stop_all_halts_every_started_source() {
    let mut session = seed_session();
    session.play().unwrap();
    session.play().unwrap();
    assert_eq!(session.source_count(), 2);

    session.stop_all();
    assert_eq!(session.sink().stopped_count(), 2);
}
