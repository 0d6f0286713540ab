//! Composition Validator
//!
//! Pure structural inspection of a composition. Any reported entry gates
//! synthesis; an empty result means the composition is synthesizable. The
//! rule table lives here in one place so it can track the engine contract.

use serde::Serialize;

use crate::composition::settings::{FS_RANGE, MULTIPLIER_MAX, VOLUME_RANGE};
use crate::composition::{Composition, SegmentId};

/// Where a structural problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "at")]
pub enum Location {
    Composition,
    Track { row: usize },
    Segment { row: usize, segment: SegmentId },
    Setting { field: &'static str },
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Composition => write!(f, "composition"),
            Location::Track { row } => write!(f, "track {row}"),
            Location::Segment { row, segment } => write!(f, "track {row}, {segment}"),
            Location::Setting { field } => write!(f, "setting '{field}'"),
        }
    }
}

/// A single structural problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionError {
    /// Where the problem is.
    pub location: Location,

    /// What is wrong, phrased for the alert modal.
    pub message: String,
}

impl std::fmt::Display for CompositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Non-empty list of structural problems. Transient and derived; never
/// persisted with the composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub errors: Vec<CompositionError>,
}

impl ErrorReport {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for err in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
            first = false;
        }
        Ok(())
    }
}

/// Inspect a composition for structural problems.
///
/// Pure: same input, same output, no side effects. Returns `None` when the
/// composition is synthesizable.
pub fn validate(composition: &Composition) -> Option<ErrorReport> {
    let mut errors = Vec::new();

    if composition.timelines.is_empty() {
        errors.push(CompositionError {
            location: Location::Composition,
            message: "composition has no timelines".to_string(),
        });
    }

    for (row, timeline) in composition.timelines.iter().enumerate() {
        if timeline.segments.is_empty() {
            errors.push(CompositionError {
                location: Location::Track { row },
                message: "timeline has no segments".to_string(),
            });
            continue;
        }

        let mut prev_end: Option<f64> = None;
        for seg in &timeline.segments {
            let at = Location::Segment {
                row,
                segment: seg.id,
            };

            if !seg.start.is_finite() || seg.start < 0.0 {
                errors.push(CompositionError {
                    location: at,
                    message: format!("start must be finite and >= 0 (got {})", seg.start),
                });
            }
            if !seg.duration.is_finite() || seg.duration <= 0.0 {
                errors.push(CompositionError {
                    location: at,
                    message: format!("duration must be finite and > 0 (got {})", seg.duration),
                });
            }
            if !seg.frequency.is_finite() || seg.frequency <= 0.0 {
                errors.push(CompositionError {
                    location: at,
                    message: format!("frequency must be finite and > 0 (got {})", seg.frequency),
                });
            }
            if !seg.amplitude.is_finite() || !(0.0..=1.0).contains(&seg.amplitude) {
                errors.push(CompositionError {
                    location: at,
                    message: format!("amplitude must be in [0, 1] (got {})", seg.amplitude),
                });
            }

            // Playback order: each segment starts at or after the previous
            // one ends.
            if let Some(end) = prev_end {
                if seg.start < end {
                    errors.push(CompositionError {
                        location: at,
                        message: format!(
                            "segment overlaps the previous one (starts {} before {})",
                            seg.start, end
                        ),
                    });
                }
            }
            prev_end = Some(seg.end().max(prev_end.unwrap_or(f64::NEG_INFINITY)));
        }
    }

    let settings = &composition.settings;
    check_range(&mut errors, "fs", settings.fs, FS_RANGE.0, FS_RANGE.1);
    check_range(
        &mut errors,
        "volume",
        settings.volume,
        VOLUME_RANGE.0,
        VOLUME_RANGE.1,
    );
    if !settings.multiplier.is_finite()
        || settings.multiplier <= 0.0
        || settings.multiplier > MULTIPLIER_MAX
    {
        errors.push(CompositionError {
            location: Location::Setting {
                field: "multiplier",
            },
            message: format!(
                "multiplier must be in (0, {MULTIPLIER_MAX}] (got {})",
                settings.multiplier
            ),
        });
    }

    if errors.is_empty() {
        None
    } else {
        Some(ErrorReport { errors })
    }
}

fn check_range(
    errors: &mut Vec<CompositionError>,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !value.is_finite() || value < min || value > max {
        errors.push(CompositionError {
            location: Location::Setting { field },
            message: format!("{field} must be in [{min}, {max}] (got {value})"),
        });
    }
}
