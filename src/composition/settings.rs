//! Composition settings: named scalars with defaults and valid ranges

use serde::{Deserialize, Serialize};

use crate::error::{ArithmusicError, Result};

/// Default sample rate in Hz.
pub const DEFAULT_FS: f64 = 44100.0;
/// Valid sample rate range in Hz.
pub const FS_RANGE: (f64, f64) = (8000.0, 192000.0);

/// Default output volume.
pub const DEFAULT_VOLUME: f64 = 1.0;
/// Valid output volume range.
pub const VOLUME_RANGE: (f64, f64) = (0.0, 1.0);

/// Default frequency multiplier.
pub const DEFAULT_MULTIPLIER: f64 = 1.0;
/// Valid frequency multiplier upper bound (lower bound is exclusive zero).
pub const MULTIPLIER_MAX: f64 = 16.0;

/// Synthesis settings owned by the composition.
///
/// Values are stored as-given; range problems are reported by the
/// [`validate`](crate::validate::validate) pass, not rejected at the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Sample rate in Hz.
    pub fs: f64,

    /// Output volume in [0, 1].
    pub volume: f64,

    /// Frequency multiplier applied to every segment.
    pub multiplier: f64,

    /// Whether the engine may alias (naive waveforms) instead of
    /// band-limiting.
    pub aliasing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fs: DEFAULT_FS,
            volume: DEFAULT_VOLUME,
            multiplier: DEFAULT_MULTIPLIER,
            aliasing: false,
        }
    }
}

/// A single settings-field assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "field", content = "value")]
pub enum SettingsChange {
    Fs(f64),
    Volume(f64),
    Multiplier(f64),
    Aliasing(bool),
}

impl SettingsChange {
    /// Parse a change from a field name and a JSON value.
    ///
    /// Used by callers that receive untyped `{field: value}` input (the
    /// settings modal); unknown names and wrong types are rejected.
    pub fn from_named(name: &str, value: &serde_json::Value) -> Result<Self> {
        let unknown = || ArithmusicError::UnknownSettingsField {
            name: name.to_string(),
        };
        match name {
            "fs" => value.as_f64().map(SettingsChange::Fs).ok_or_else(unknown),
            "volume" => value
                .as_f64()
                .map(SettingsChange::Volume)
                .ok_or_else(unknown),
            "multiplier" => value
                .as_f64()
                .map(SettingsChange::Multiplier)
                .ok_or_else(unknown),
            "aliasing" => value
                .as_bool()
                .map(SettingsChange::Aliasing)
                .ok_or_else(unknown),
            _ => Err(unknown()),
        }
    }

    /// Field name this change targets.
    pub fn field_name(&self) -> &'static str {
        match self {
            SettingsChange::Fs(_) => "fs",
            SettingsChange::Volume(_) => "volume",
            SettingsChange::Multiplier(_) => "multiplier",
            SettingsChange::Aliasing(_) => "aliasing",
        }
    }
}

impl Settings {
    /// Apply a single field change.
    pub fn apply(&mut self, change: SettingsChange) {
        match change {
            SettingsChange::Fs(fs) => self.fs = fs,
            SettingsChange::Volume(volume) => self.volume = volume,
            SettingsChange::Multiplier(multiplier) => self.multiplier = multiplier,
            SettingsChange::Aliasing(aliasing) => self.aliasing = aliasing,
        }
    }

    /// Reset every field to its default.
    pub fn reset(&mut self) {
        *self = Settings::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_reset() {
        let mut settings = Settings::default();
        settings.apply(SettingsChange::Fs(48000.0));
        settings.apply(SettingsChange::Aliasing(true));
        assert_eq!(settings.fs, 48000.0);
        assert!(settings.aliasing);

        settings.reset();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_from_named_rejects_unknown_field() {
        let err = SettingsChange::from_named("tempo", &serde_json::json!(120)).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_SETTINGS_FIELD");
    }

    #[test]
    fn test_from_named_rejects_wrong_type() {
        assert!(SettingsChange::from_named("aliasing", &serde_json::json!(1.0)).is_err());
        let change = SettingsChange::from_named("fs", &serde_json::json!(22050.0)).unwrap();
        assert_eq!(change, SettingsChange::Fs(22050.0));
    }

    #[test]
    fn test_out_of_range_value_is_stored() {
        // Range problems are the validator's job, not the setter's.
        let mut settings = Settings::default();
        settings.apply(SettingsChange::Fs(-1.0));
        assert_eq!(settings.fs, -1.0);
    }
}
