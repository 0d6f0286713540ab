//! Serialization Layer Tests
//!
//! Round-trip and malformed-document behavior for the wire documents and
//! the project file.

use pretty_assertions::assert_eq;
use test_case::test_case;

use arithmusic::composition::{
    CompositionStore, SegmentPatch, SettingsChange, TrackOption, Waveform,
};
use arithmusic::document::{
    export_composition_json, export_settings_json, parse_composition_json, ProjectFile,
};
use arithmusic::ArithmusicError;

/// A composition with some texture: two tracks, options, patched params.
fn textured_store() -> CompositionStore {
    let mut store = CompositionStore::new();
    let first = store.add_track();
    let second = store.add_track();

    let a = store.add_segment(first, 0.0, 1.0).unwrap();
    store.add_segment(first, 1.0, 0.5).unwrap();
    store.add_segment(second, 0.0, 2.0).unwrap();

    store
        .segment_data_change(
            first,
            a,
            &SegmentPatch {
                frequency: Some(220.0),
                amplitude: Some(0.8),
                waveform: Some(Waveform::Triangle),
                ..Default::default()
            },
        )
        .unwrap();
    store
        .track_option_change(second, TrackOption::Gain(0.5))
        .unwrap();
    store.settings_change(SettingsChange::Multiplier(2.0));
    store
}

#[test]
fn load_of_export_preserves_structure_and_params() {
    let store = textured_store();
    let json = export_composition_json(store.composition()).unwrap();

    let mut fresh = CompositionStore::new();
    fresh
        .load_composition(parse_composition_json(&json).unwrap())
        .unwrap();

    let original = store.composition();
    let loaded = fresh.composition();
    assert_eq!(loaded.timelines.len(), original.timelines.len());
    for (orig_tl, load_tl) in original.timelines.iter().zip(&loaded.timelines) {
        assert_eq!(load_tl.options, orig_tl.options);
        assert_eq!(load_tl.segments.len(), orig_tl.segments.len());
        for (orig_seg, load_seg) in orig_tl.segments.iter().zip(&load_tl.segments) {
            assert_eq!(load_seg.start, orig_seg.start);
            assert_eq!(load_seg.duration, orig_seg.duration);
            assert_eq!(load_seg.frequency, orig_seg.frequency);
            assert_eq!(load_seg.amplitude, orig_seg.amplitude);
            assert_eq!(load_seg.waveform, orig_seg.waveform);
        }
    }
}

#[test]
fn loaded_ids_are_unique_and_order_preserving() {
    let json = r#"{"timelines": [
        {"segments": [
            {"id": 40, "start": 0.0, "duration": 1.0},
            {"id": 7,  "start": 1.0, "duration": 1.0}
        ]},
        {"segments": [
            {"id": 40, "start": 0.0, "duration": 1.0}
        ]}
    ]}"#;

    let mut store = CompositionStore::new();
    store
        .load_composition(parse_composition_json(json).unwrap())
        .unwrap();

    let ids: Vec<u64> = store
        .composition()
        .timelines
        .iter()
        .flat_map(|tl| tl.segments.iter())
        .map(|s| s.id.0)
        .collect();
    assert_eq!(ids, vec![0, 1, 2], "dense, unique, traversal order");

    // The next assigned id continues past everything loaded.
    let track = store.composition().timelines[0].id;
    let next = store.add_segment(track, 2.0, 1.0).unwrap();
    assert_eq!(next.0, 3);
}

#[test]
fn settings_document_round_trip() {
    let mut store = CompositionStore::with_seed();
    store.settings_change(SettingsChange::Aliasing(true));
    store.settings_change(SettingsChange::Volume(0.25));

    let json = export_settings_json(&store.composition().settings).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value,
        serde_json::json!({"fs": 44100.0, "volume": 0.25, "multiplier": 1.0, "aliasing": true})
    );
}

#[test_case(r#"[]"#, "document" ; "root not an object")]
#[test_case(r#"{}"#, "timelines" ; "missing timelines")]
#[test_case(r#"{"timelines": {}}"#, "timelines" ; "timelines not an array")]
#[test_case(r#"{"timelines": [[]]}"#, "timelines[0]" ; "timeline not an object")]
#[test_case(r#"{"timelines": [{"options": {}}]}"#, "timelines[0].segments" ; "missing segments")]
#[test_case(
    r#"{"timelines": [{"segments": [{"start": 0, "duration": 1}]}]}"#,
    "timelines[0].segments[0].id" ; "segment missing id"
)]
#[test_case(
    r#"{"timelines": [{"segments": [{"id": -3, "start": 0, "duration": 1}]}]}"#,
    "timelines[0].segments[0].id" ; "negative id"
)]
#[test_case(
    r#"{"timelines": [{"segments": [{"id": 0, "start": "zero", "duration": 1}]}]}"#,
    "timelines[0].segments[0].start" ; "start not a number"
)]
fn malformed_document_names_offending_field(input: &str, expected_field: &str) {
    match parse_composition_json(input).unwrap_err() {
        ArithmusicError::DocumentFormat { field, .. } => assert_eq!(field, expected_field),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_load_leaves_composition_untouched() {
    let mut store = CompositionStore::with_seed();
    let before = store.composition().clone();
    let revision = store.revision();

    assert!(parse_composition_json(r#"{"timelines": 0}"#).is_err());

    assert_eq!(store.composition(), &before);
    assert_eq!(store.revision(), revision);
}

#[test]
fn project_file_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("piece.json");

    let store = textured_store();
    ProjectFile::snapshot(store.composition())
        .unwrap()
        .save_to(&path)
        .unwrap();

    let loaded = ProjectFile::load_from(&path)
        .unwrap()
        .into_composition()
        .unwrap();
    assert_eq!(loaded.settings, store.composition().settings);
    assert_eq!(loaded.timelines.len(), 2);
    assert_eq!(
        loaded.timelines[0].segments[0].waveform,
        Waveform::Triangle
    );
}

#[test]
fn tampered_project_file_fails_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("piece.json");

    let store = CompositionStore::with_seed();
    ProjectFile::snapshot(store.composition())
        .unwrap()
        .save_to(&path)
        .unwrap();

    // The wire document is embedded as a string, so its quotes are escaped
    // in the file text.
    let content = std::fs::read_to_string(&path)
        .unwrap()
        .replace("\\\"duration\\\":1.0", "\\\"duration\\\":9.0");
    std::fs::write(&path, content).unwrap();

    match ProjectFile::load_from(&path).unwrap_err() {
        ArithmusicError::Checksum { .. } => {}
        other => panic!("unexpected error: {other}"),
    }
}
