//! Composition Store Tests
//!
//! Identity, selection, rearrange, and validation-gating invariants over
//! sequences of editing operations.

use test_case::test_case;

use arithmusic::composition::{
    CompositionStore, SegmentId, SegmentPatch, SettingsChange, TrackOption,
};
use arithmusic::validate::validate;

/// Helper: a store with two tracks of three segments each, back to back.
fn two_track_store() -> CompositionStore {
    let mut store = CompositionStore::new();
    for _ in 0..2 {
        let track = store.add_track();
        for i in 0..3 {
            store.add_segment(track, i as f64, 1.0).unwrap();
        }
    }
    store
}

#[test]
fn ids_strictly_increase_across_interleaved_add_delete() {
    let mut store = CompositionStore::new();
    let a = store.add_track();
    let b = store.add_track();

    let mut seen = Vec::new();
    for round in 0..4 {
        let track = if round % 2 == 0 { a } else { b };
        let id = store.add_segment(track, round as f64, 0.5).unwrap();
        seen.push(id);
        if round == 1 {
            store.delete_segment(b, id).unwrap();
        }
    }

    for pair in seen.windows(2) {
        assert!(pair[0] < pair[1], "ids must strictly increase: {seen:?}");
    }
}

#[test]
fn rearrange_within_timeline_preserves_untouched_order() {
    let mut store = two_track_store();
    let track = store.composition().timelines[0].id;
    let ids: Vec<SegmentId> = store.composition().timelines[0]
        .segments
        .iter()
        .map(|s| s.id)
        .collect();

    // Move the last segment to the front of its own timeline.
    store.rearrange_segment(track, ids[2], track, 0).unwrap();

    let after: Vec<SegmentId> = store.composition().timelines[0]
        .segments
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(after, vec![ids[2], ids[0], ids[1]]);
    assert_eq!(store.composition().segment_count(), 6);

    // The other timeline is untouched.
    let other: Vec<SegmentId> = store.composition().timelines[1]
        .segments
        .iter()
        .map(|s| s.id)
        .collect();
    assert!(other.windows(2).all(|p| p[0] < p[1]));
}

#[test]
fn selection_survives_unrelated_track_deletion() {
    let mut store = two_track_store();
    let doomed = store.composition().timelines[0].id;
    let kept = store.composition().timelines[1].id;
    let seg = store.composition().timelines[1].segments[0].id;

    store.select_segment(Some((kept, seg))).unwrap();
    store.delete_track(doomed).unwrap();

    let (timeline, segment) = store.selected_segment().expect("selection survives");
    assert_eq!(timeline.id, kept);
    assert_eq!(segment.id, seg);
}

#[test]
fn selecting_missing_segment_is_rejected() {
    let mut store = two_track_store();
    let track = store.composition().timelines[0].id;
    let err = store
        .select_segment(Some((track, SegmentId(999))))
        .unwrap_err();
    assert_eq!(err.error_code(), "SEGMENT_NOT_FOUND");
    assert_eq!(store.selection(), None);
}

#[test]
fn track_options_do_not_touch_segments() {
    let mut store = two_track_store();
    let track = store.composition().timelines[0].id;

    store
        .track_option_change(track, TrackOption::Gain(0.25))
        .unwrap();
    store
        .track_option_change(track, TrackOption::Mute(true))
        .unwrap();

    let timeline = store.composition().timeline(track).unwrap();
    assert_eq!(timeline.options.gain, 0.25);
    assert!(timeline.options.mute);
    assert_eq!(timeline.segments.len(), 3);
}

#[test]
fn patch_cannot_invalidate_silently() {
    // An out-of-range patch is stored, then reported by validation.
    let mut store = two_track_store();
    let track = store.composition().timelines[0].id;
    let seg = store.composition().timelines[0].segments[0].id;

    store
        .segment_data_change(
            track,
            seg,
            &SegmentPatch {
                duration: Some(-2.0),
                ..Default::default()
            },
        )
        .unwrap();

    let report = validate(store.composition()).expect("negative duration must report");
    assert!(report
        .errors
        .iter()
        .any(|e| e.message.contains("duration")));
}

// Settings range rules: value stored as-given, validator decides.
#[test_case(SettingsChange::Fs(-1.0), false ; "negative sample rate")]
#[test_case(SettingsChange::Fs(44100.0), true ; "standard sample rate")]
#[test_case(SettingsChange::Fs(500.0), false ; "sample rate below range")]
#[test_case(SettingsChange::Volume(1.5), false ; "volume above unity")]
#[test_case(SettingsChange::Volume(0.0), true ; "silent volume is legal")]
#[test_case(SettingsChange::Multiplier(0.0), false ; "zero multiplier")]
#[test_case(SettingsChange::Multiplier(16.0), true ; "multiplier at cap")]
#[test_case(SettingsChange::Multiplier(17.0), false ; "multiplier past cap")]
fn settings_change_validation(change: SettingsChange, synthesizable: bool) {
    let mut store = CompositionStore::with_seed();
    store.settings_change(change);
    assert_eq!(validate(store.composition()).is_none(), synthesizable);
}

#[test]
fn reset_settings_restores_synthesizability() {
    let mut store = CompositionStore::with_seed();
    store.settings_change(SettingsChange::Fs(-1.0));
    assert!(validate(store.composition()).is_some());

    store.reset_settings();
    assert!(validate(store.composition()).is_none());
    assert_eq!(store.composition().settings.fs, 44100.0);
}
