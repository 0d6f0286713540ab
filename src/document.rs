//! Serialization Layer
//!
//! Converts between the in-memory composition and the canonical wire
//! documents the synthesis engine consumes (see the engine API), plus the
//! on-disk project file the save/load modals traffic in. Malformed input
//! fails with a `DocumentFormat` error naming the offending field and leaves
//! the existing composition untouched.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::composition::{Composition, Settings, Timeline};
use crate::error::{ArithmusicError, Result};

/// Wire document: `{ "timelines": [ { "options": {...}, "segments": [...] } ] }`.
///
/// Settings travel as a separate document; track and segment ids local to
/// this session are reassigned on load, not trusted from the wire.
#[derive(Debug, Deserialize)]
struct CompositionDoc {
    timelines: Vec<Timeline>,
}

#[derive(Serialize)]
struct CompositionDocRef<'a> {
    timelines: &'a [Timeline],
}

/// Serialize a composition to the engine's wire format.
pub fn export_composition_json(composition: &Composition) -> Result<String> {
    let doc = CompositionDocRef {
        timelines: &composition.timelines,
    };
    Ok(serde_json::to_string(&doc)?)
}

/// Serialize settings to the engine's wire format:
/// `{ "fs", "volume", "multiplier", "aliasing" }`.
pub fn export_settings_json(settings: &Settings) -> Result<String> {
    Ok(serde_json::to_string(settings)?)
}

/// Parse a composition wire document.
///
/// The returned composition carries the document's raw segment ids; feed it
/// to [`CompositionStore::load_composition`](crate::composition::CompositionStore::load_composition)
/// to get a clean id space.
pub fn parse_composition_json(input: &str) -> Result<Composition> {
    let value: serde_json::Value =
        serde_json::from_str(input).map_err(|e| ArithmusicError::DocumentFormat {
            field: "document".to_string(),
            reason: e.to_string(),
        })?;
    check_composition_shape(&value)?;

    let doc: CompositionDoc =
        serde_json::from_value(value).map_err(|e| ArithmusicError::DocumentFormat {
            field: "timelines".to_string(),
            reason: e.to_string(),
        })?;

    Ok(Composition {
        timelines: doc.timelines,
        settings: Settings::default(),
    })
}

/// Parse a settings wire document.
pub fn parse_settings_json(input: &str) -> Result<Settings> {
    serde_json::from_str(input).map_err(|e| ArithmusicError::DocumentFormat {
        field: "settings".to_string(),
        reason: e.to_string(),
    })
}

/// Field-level shape check so format errors can name what is wrong instead
/// of surfacing a deserializer offset.
fn check_composition_shape(value: &serde_json::Value) -> Result<()> {
    let bad = |field: &str, reason: &str| {
        Err(ArithmusicError::DocumentFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        })
    };

    let root = match value.as_object() {
        Some(root) => root,
        None => return bad("document", "expected a JSON object"),
    };
    let timelines = match root.get("timelines") {
        Some(serde_json::Value::Array(timelines)) => timelines,
        Some(_) => return bad("timelines", "expected an array"),
        None => return bad("timelines", "missing field"),
    };

    for (row, timeline) in timelines.iter().enumerate() {
        let obj = match timeline.as_object() {
            Some(obj) => obj,
            None => return bad(&format!("timelines[{row}]"), "expected an object"),
        };
        let segments = match obj.get("segments") {
            Some(serde_json::Value::Array(segments)) => segments,
            Some(_) => return bad(&format!("timelines[{row}].segments"), "expected an array"),
            None => return bad(&format!("timelines[{row}].segments"), "missing field"),
        };

        for (col, segment) in segments.iter().enumerate() {
            let at = |name: &str| format!("timelines[{row}].segments[{col}].{name}");
            let obj = match segment.as_object() {
                Some(obj) => obj,
                None => {
                    return bad(
                        &format!("timelines[{row}].segments[{col}]"),
                        "expected an object",
                    )
                }
            };

            match obj.get("id") {
                Some(id) if id.as_u64().is_some() => {}
                Some(_) => return bad(&at("id"), "expected a non-negative integer"),
                None => return bad(&at("id"), "missing field"),
            }
            for name in ["start", "duration"] {
                match obj.get(name) {
                    Some(v) if v.as_f64().is_some() => {}
                    Some(_) => return bad(&at(name), "expected a number"),
                    None => return bad(&at(name), "missing field"),
                }
            }
        }
    }

    Ok(())
}

/// On-disk project file: the composition wire document as a string (exactly
/// what the save modal shows), the settings, a save timestamp, and a
/// checksum over the document for integrity.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectFile {
    /// When the file was written.
    pub saved_at: DateTime<Utc>,

    /// SHA-256 hex digest of the `composition` string.
    pub checksum: String,

    /// Composition wire document.
    pub composition: String,

    /// Settings at save time.
    pub settings: Settings,
}

impl ProjectFile {
    /// Build a project file snapshot of a composition.
    pub fn snapshot(composition: &Composition) -> Result<Self> {
        let doc = export_composition_json(composition)?;
        Ok(Self {
            saved_at: Utc::now(),
            checksum: sha256_hex(&doc),
            composition: doc,
            settings: composition.settings.clone(),
        })
    }

    /// Write the project file to disk.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Read and verify a project file from disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: ProjectFile =
            serde_json::from_str(&content).map_err(|e| ArithmusicError::DocumentFormat {
                field: "project".to_string(),
                reason: e.to_string(),
            })?;

        let actual = sha256_hex(&file.composition);
        if actual != file.checksum {
            return Err(ArithmusicError::Checksum {
                expected: file.checksum,
                actual,
            });
        }
        Ok(file)
    }

    /// Parse the embedded document into a composition with these settings.
    pub fn into_composition(self) -> Result<Composition> {
        let mut composition = parse_composition_json(&self.composition)?;
        composition.settings = self.settings;
        Ok(composition)
    }
}

fn sha256_hex(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}
