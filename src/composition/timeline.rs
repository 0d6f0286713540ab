//! Timeline (track): one lane of segments with per-lane options

use std::fmt;

use serde::{Deserialize, Serialize};

use super::segment::{Segment, SegmentId};

/// Session-unique identifier for a timeline.
///
/// Row position in the composition is meaningful for display and playback;
/// the id exists so selection can survive row shifts (a deleted row above the
/// selected one must not silently re-target the selection).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track#{}", self.0)
    }
}

/// Per-track options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackOptions {
    /// Muted tracks contribute silence to the mix.
    #[serde(default)]
    pub mute: bool,

    /// Linear gain applied to every segment on the track.
    #[serde(default = "default_gain")]
    pub gain: f64,
}

fn default_gain() -> f64 {
    1.0
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            mute: false,
            gain: default_gain(),
        }
    }
}

/// A single named option change on a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackOption {
    Mute(bool),
    Gain(f64),
}

/// One lane of segments in playback order, plus its options.
///
/// Owned exclusively by the [`Composition`](crate::composition::Composition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Session-unique track id (not part of the wire document).
    #[serde(skip)]
    pub id: TrackId,

    /// Per-track options.
    #[serde(default)]
    pub options: TrackOptions,

    /// Segments in playback order.
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Timeline {
    /// Create an empty timeline with default options.
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            options: TrackOptions::default(),
            segments: Vec::new(),
        }
    }

    /// Find the index of a segment by id.
    pub fn position_of(&self, segment: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id == segment)
    }

    /// Look up a segment by id.
    pub fn segment(&self, segment: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment)
    }

    /// Look up a segment by id, mutably.
    pub fn segment_mut(&mut self, segment: SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id == segment)
    }

    /// Apply a single option change.
    pub fn set_option(&mut self, option: TrackOption) {
        match option {
            TrackOption::Mute(mute) => self.options.mute = mute,
            TrackOption::Gain(gain) => self.options.gain = gain,
        }
    }
}
