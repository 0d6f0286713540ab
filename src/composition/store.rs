//! Composition Store
//!
//! Sole writer of composition state. Every mutation is a named command
//! ([`EditOp`]) applied atomically: referents are checked before anything is
//! touched, the revision counter is bumped inside the same commit that
//! appends the operation log record, and failed operations change nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ArithmusicError, Result};

use super::segment::{Segment, SegmentId, SegmentPatch};
use super::settings::SettingsChange;
use super::timeline::{Timeline, TrackId, TrackOption};
use super::Composition;

/// The selected segment, if any: a weak (track id, segment id) reference
/// resolved at read time, never an index pair.
pub type Selection = Option<(TrackId, SegmentId)>;

/// A named, parameterized mutation of the composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum EditOp {
    AddTrack,
    DeleteTrack {
        track: TrackId,
    },
    AddSegment {
        track: TrackId,
        start: f64,
        duration: f64,
    },
    DeleteSegment {
        track: TrackId,
        segment: SegmentId,
    },
    TrackOptionChange {
        track: TrackId,
        option: TrackOption,
    },
    SegmentDataChange {
        track: TrackId,
        segment: SegmentId,
        patch: SegmentPatch,
    },
    SelectSegment {
        target: Selection,
    },
    RearrangeSegment {
        from_track: TrackId,
        segment: SegmentId,
        to_track: TrackId,
        to_index: usize,
    },
    SettingsChange {
        change: SettingsChange,
    },
    ResetSettings,
    /// A whole-composition replacement from a loaded document. The document
    /// itself is not duplicated into the log.
    LoadComposition,
}

impl EditOp {
    /// Short human-readable summary for the operation log.
    pub fn describe(&self) -> String {
        match self {
            EditOp::AddTrack => "add track".to_string(),
            EditOp::DeleteTrack { track } => format!("delete {track}"),
            EditOp::AddSegment { track, .. } => format!("add segment to {track}"),
            EditOp::DeleteSegment { track, segment } => format!("delete {segment} from {track}"),
            EditOp::TrackOptionChange { track, .. } => format!("change option on {track}"),
            EditOp::SegmentDataChange { track, segment, .. } => {
                format!("change {segment} on {track}")
            }
            EditOp::SelectSegment { target: Some((t, s)) } => format!("select {s} on {t}"),
            EditOp::SelectSegment { target: None } => "clear selection".to_string(),
            EditOp::RearrangeSegment {
                from_track,
                segment,
                to_track,
                to_index,
            } => format!("move {segment} from {from_track} to {to_track}[{to_index}]"),
            EditOp::SettingsChange { change } => format!("set {}", change.field_name()),
            EditOp::ResetSettings => "reset settings".to_string(),
            EditOp::LoadComposition => "load composition".to_string(),
        }
    }
}

/// One entry of the operation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpRecord {
    /// Unique identifier for this record.
    pub id: String,

    /// When the operation was applied.
    pub timestamp: DateTime<Utc>,

    /// The operation that was applied.
    pub op: EditOp,

    /// Revision counter value after the operation.
    pub revision: u64,
}

impl OpRecord {
    fn new(op: EditOp, revision: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            op,
            revision,
        }
    }
}

/// Owner of the composition, selection, identity counters, revision counter
/// and operation log.
#[derive(Debug, Clone, Default)]
pub struct CompositionStore {
    composition: Composition,
    selection: Selection,
    next_segment_id: u64,
    next_track_id: u64,
    revision: u64,
    op_log: Vec<OpRecord>,
}

impl CompositionStore {
    /// Create an empty store: no timelines, default settings, revision 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with one track holding one default segment,
    /// the editor's starting composition.
    pub fn with_seed() -> Self {
        let mut store = Self::new();
        let track = store.add_track();
        store
            .add_segment(track, 0.0, 1.0)
            .expect("seed track exists");
        store
    }

    // --- Read surface -----------------------------------------------------

    /// The current composition. Read-only; mutations go through the ops.
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Monotonic change counter. Consumers compare against their last-seen
    /// value; equality means no redraw is needed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The current selection reference, if any.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Resolve the selection to the live timeline and segment.
    ///
    /// Returns `None` both when nothing is selected and when the reference
    /// no longer resolves (which the mutation ops prevent, but resolution is
    /// still done at read time rather than trusted).
    pub fn selected_segment(&self) -> Option<(&Timeline, &Segment)> {
        let (track, segment) = self.selection?;
        let timeline = self.composition.timeline(track)?;
        let segment = timeline.segment(segment)?;
        Some((timeline, segment))
    }

    /// The operation log, oldest first.
    pub fn op_log(&self) -> &[OpRecord] {
        &self.op_log
    }

    // --- Mutation surface -------------------------------------------------

    /// Apply a named operation.
    ///
    /// `AddTrack`/`AddSegment` assign ids internally; use the direct methods
    /// when the caller needs the new id back. `LoadComposition` carries a
    /// document and is only reachable through [`load_composition`](Self::load_composition).
    pub fn apply(&mut self, op: EditOp) -> Result<()> {
        match op {
            EditOp::AddTrack => {
                self.add_track();
                Ok(())
            }
            EditOp::DeleteTrack { track } => self.delete_track(track),
            EditOp::AddSegment {
                track,
                start,
                duration,
            } => self.add_segment(track, start, duration).map(|_| ()),
            EditOp::DeleteSegment { track, segment } => self.delete_segment(track, segment),
            EditOp::TrackOptionChange { track, option } => self.track_option_change(track, option),
            EditOp::SegmentDataChange {
                track,
                segment,
                patch,
            } => self.segment_data_change(track, segment, &patch),
            EditOp::SelectSegment { target } => self.select_segment(target),
            EditOp::RearrangeSegment {
                from_track,
                segment,
                to_track,
                to_index,
            } => self.rearrange_segment(from_track, segment, to_track, to_index),
            EditOp::SettingsChange { change } => {
                self.settings_change(change);
                Ok(())
            }
            EditOp::ResetSettings => {
                self.reset_settings();
                Ok(())
            }
            EditOp::LoadComposition => Err(ArithmusicError::DocumentFormat {
                field: "op".to_string(),
                reason: "load_composition requires a document".to_string(),
            }),
        }
    }

    /// Append an empty track and return its id.
    pub fn add_track(&mut self) -> TrackId {
        let id = TrackId(self.next_track_id);
        self.next_track_id += 1;
        self.composition.timelines.push(Timeline::new(id));
        self.commit(EditOp::AddTrack);
        id
    }

    /// Delete a track and every segment it owns. Selection pointing into the
    /// track is cleared in the same transition.
    pub fn delete_track(&mut self, track: TrackId) -> Result<()> {
        let row = self
            .composition
            .row_of(track)
            .ok_or(ArithmusicError::TrackNotFound { track })?;
        self.composition.timelines.remove(row);
        if matches!(self.selection, Some((t, _)) if t == track) {
            self.selection = None;
        }
        self.commit(EditOp::DeleteTrack { track });
        Ok(())
    }

    /// Append a new segment to a track, assigning the next segment id.
    /// Ids strictly increase and are never reused, even after deletes.
    pub fn add_segment(&mut self, track: TrackId, start: f64, duration: f64) -> Result<SegmentId> {
        let id = SegmentId(self.next_segment_id);
        let timeline = self
            .timeline_mut(track)
            .ok_or(ArithmusicError::TrackNotFound { track })?;
        timeline.segments.push(Segment::new(id, start, duration));
        self.next_segment_id += 1;
        self.commit(EditOp::AddSegment {
            track,
            start,
            duration,
        });
        Ok(id)
    }

    /// Delete a segment. Selection referring to it is cleared atomically
    /// with the deletion.
    pub fn delete_segment(&mut self, track: TrackId, segment: SegmentId) -> Result<()> {
        let timeline = self
            .timeline_mut(track)
            .ok_or(ArithmusicError::TrackNotFound { track })?;
        let index = timeline
            .position_of(segment)
            .ok_or(ArithmusicError::SegmentNotFound { segment })?;
        timeline.segments.remove(index);
        if matches!(self.selection, Some((_, s)) if s == segment) {
            self.selection = None;
        }
        self.commit(EditOp::DeleteSegment { track, segment });
        Ok(())
    }

    /// Change one per-track option.
    pub fn track_option_change(&mut self, track: TrackId, option: TrackOption) -> Result<()> {
        let timeline = self
            .timeline_mut(track)
            .ok_or(ArithmusicError::TrackNotFound { track })?;
        timeline.set_option(option);
        self.commit(EditOp::TrackOptionChange { track, option });
        Ok(())
    }

    /// Patch a segment's editable data in place.
    pub fn segment_data_change(
        &mut self,
        track: TrackId,
        segment: SegmentId,
        patch: &SegmentPatch,
    ) -> Result<()> {
        let timeline = self
            .timeline_mut(track)
            .ok_or(ArithmusicError::TrackNotFound { track })?;
        let seg = timeline
            .segment_mut(segment)
            .ok_or(ArithmusicError::SegmentNotFound { segment })?;
        patch.apply_to(seg);
        self.commit(EditOp::SegmentDataChange {
            track,
            segment,
            patch: patch.clone(),
        });
        Ok(())
    }

    /// Set or clear the selection. A `Some` target must resolve to a live
    /// segment.
    pub fn select_segment(&mut self, target: Selection) -> Result<()> {
        if let Some((track, segment)) = target {
            let timeline = self
                .composition
                .timeline(track)
                .ok_or(ArithmusicError::TrackNotFound { track })?;
            if timeline.segment(segment).is_none() {
                return Err(ArithmusicError::SegmentNotFound { segment });
            }
        }
        self.selection = target;
        self.commit(EditOp::SelectSegment { target });
        Ok(())
    }

    /// Move a segment within or across timelines to the given position, as a
    /// single transition. The target index is clamped to the destination
    /// length; every untouched segment keeps its relative order.
    pub fn rearrange_segment(
        &mut self,
        from_track: TrackId,
        segment: SegmentId,
        to_track: TrackId,
        to_index: usize,
    ) -> Result<()> {
        // Check both referents before mutating anything.
        if self.composition.timeline(to_track).is_none() {
            return Err(ArithmusicError::TrackNotFound { track: to_track });
        }
        let source = self
            .composition
            .timeline(from_track)
            .ok_or(ArithmusicError::TrackNotFound { track: from_track })?;
        let from_index = source
            .position_of(segment)
            .ok_or(ArithmusicError::SegmentNotFound { segment })?;

        let moved = self
            .timeline_mut(from_track)
            .expect("checked above")
            .segments
            .remove(from_index);
        let dest = self.timeline_mut(to_track).expect("checked above");
        let index = to_index.min(dest.segments.len());
        dest.segments.insert(index, moved);

        self.commit(EditOp::RearrangeSegment {
            from_track,
            segment,
            to_track,
            to_index,
        });
        Ok(())
    }

    /// Assign one settings field. The value is stored as-given; range
    /// problems surface through validation, which gates synthesis.
    pub fn settings_change(&mut self, change: SettingsChange) {
        self.composition.settings.apply(change);
        self.commit(EditOp::SettingsChange { change });
    }

    /// Reset every settings field to its default.
    pub fn reset_settings(&mut self) {
        self.composition.settings.reset();
        self.commit(EditOp::ResetSettings);
    }

    /// Replace the composition wholesale from a loaded document.
    ///
    /// Ids are renumbered densely in traversal order (so a load never
    /// collides with ids already handed out this session is irrelevant: the
    /// loaded content defines a clean id space), both counters are advanced
    /// past everything assigned, the selection is cleared, and the revision
    /// counter keeps counting up rather than resetting.
    pub fn load_composition(&mut self, mut loaded: Composition) -> Result<()> {
        let mut next_segment = 0u64;
        let mut next_track = self.next_track_id;
        for timeline in &mut loaded.timelines {
            timeline.id = TrackId(next_track);
            next_track += 1;
            for segment in &mut timeline.segments {
                segment.id = SegmentId(next_segment);
                next_segment += 1;
            }
        }

        self.composition = loaded;
        self.selection = None;
        self.next_segment_id = self.next_segment_id.max(next_segment);
        self.next_track_id = next_track;
        self.commit(EditOp::LoadComposition);
        Ok(())
    }

    fn timeline_mut(&mut self, track: TrackId) -> Option<&mut Timeline> {
        self.composition.timelines.iter_mut().find(|tl| tl.id == track)
    }

    /// Every successful mutation funnels through here: the revision bump is
    /// inseparable from the log append.
    fn commit(&mut self, op: EditOp) {
        self.revision += 1;
        debug!(revision = self.revision, op = %op.describe(), "composition mutated");
        self.op_log.push(OpRecord::new(op, self.revision));
    }
}
