//! Segment: the atomic editable unit of a composition

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Process-unique identifier for a segment.
///
/// Assigned monotonically by the [`CompositionStore`](crate::composition::CompositionStore);
/// an id is never reused within a session, even after the segment is deleted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment#{}", self.0)
    }
}

/// Waveform/algorithm selector for a segment.
///
/// Interpreted by the synthesis engine; this core only carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

/// One editable sound event with timing and synthesis parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Process-unique monotonic id.
    pub id: SegmentId,

    /// Start position in seconds.
    pub start: f64,

    /// Duration in seconds.
    pub duration: f64,

    /// Base frequency in Hz (before the settings multiplier is applied).
    #[serde(default = "default_frequency")]
    pub frequency: f64,

    /// Peak amplitude in [0, 1].
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    /// Waveform/algorithm selector.
    #[serde(default)]
    pub waveform: Waveform,

    /// Engine-specific parameters carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_frequency() -> f64 {
    440.0
}

fn default_amplitude() -> f64 {
    1.0
}

impl Segment {
    /// Create a segment with default synthesis parameters.
    pub fn new(id: SegmentId, start: f64, duration: f64) -> Self {
        Self {
            id,
            start,
            duration,
            frequency: default_frequency(),
            amplitude: default_amplitude(),
            waveform: Waveform::default(),
            extra: BTreeMap::new(),
        }
    }

    /// End position in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A partial update to a segment's editable data.
///
/// `None` fields are left unchanged; timing and parameters are the editable
/// surface, the id is not.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub waveform: Option<Waveform>,
}

impl SegmentPatch {
    /// Apply this patch to a segment in place.
    pub fn apply_to(&self, segment: &mut Segment) {
        if let Some(start) = self.start {
            segment.start = start;
        }
        if let Some(duration) = self.duration {
            segment.duration = duration;
        }
        if let Some(frequency) = self.frequency {
            segment.frequency = frequency;
        }
        if let Some(amplitude) = self.amplitude {
            segment.amplitude = amplitude;
        }
        if let Some(waveform) = self.waveform {
            segment.waveform = waveform;
        }
    }
}
