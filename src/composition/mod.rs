//! Composition Data Model
//!
//! The user-authored piece: an ordered sequence of timelines (row order is
//! meaningful) plus the synthesis settings. All mutation goes through the
//! [`CompositionStore`], which owns identity counters, selection state, the
//! revision counter, and the operation log.

pub mod segment;
pub mod settings;
pub mod store;
pub mod timeline;

use serde::{Deserialize, Serialize};

pub use segment::{Segment, SegmentId, SegmentPatch, Waveform};
pub use settings::{Settings, SettingsChange};
pub use store::{CompositionStore, EditOp, OpRecord, Selection};
pub use timeline::{Timeline, TrackId, TrackOption, TrackOptions};

/// The full user-authored piece: timelines + settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    /// Timelines in row order.
    #[serde(default)]
    pub timelines: Vec<Timeline>,

    /// Synthesis settings.
    #[serde(default)]
    pub settings: Settings,
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            timelines: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl Composition {
    /// Total number of segments across all timelines.
    pub fn segment_count(&self) -> usize {
        self.timelines.iter().map(|tl| tl.segments.len()).sum()
    }

    /// Find a timeline by track id.
    pub fn timeline(&self, track: TrackId) -> Option<&Timeline> {
        self.timelines.iter().find(|tl| tl.id == track)
    }

    /// Row index of a track.
    pub fn row_of(&self, track: TrackId) -> Option<usize> {
        self.timelines.iter().position(|tl| tl.id == track)
    }
}
