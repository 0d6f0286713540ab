//! Error handling for Arithmusic
//!
//! One taxonomy covers the whole core: validation and document errors are
//! recovered locally and surfaced to the UI layer, engine/busy errors abort
//! only the current synthesis attempt.

use thiserror::Error;

use crate::composition::{SegmentId, TrackId};
use crate::validate::ErrorReport;

/// Result type alias for Arithmusic operations
pub type Result<T> = std::result::Result<T, ArithmusicError>;

/// Main error type for Arithmusic operations
#[derive(Error, Debug)]
pub enum ArithmusicError {
    // Composition Errors
    #[error("Composition is not synthesizable: {report}")]
    Validation { report: ErrorReport },

    #[error("Track not found: {track}")]
    TrackNotFound { track: TrackId },

    #[error("Segment not found: {segment}")]
    SegmentNotFound { segment: SegmentId },

    #[error("Unknown settings field: {name}")]
    UnknownSettingsField { name: String },

    // Document Errors
    #[error("Malformed document at '{field}': {reason}")]
    DocumentFormat { field: String, reason: String },

    #[error("Project file checksum mismatch: expected {expected}, got {actual}")]
    Checksum { expected: String, actual: String },

    // Synthesis Errors
    #[error("Synthesis engine error: {reason}")]
    Engine { reason: String },

    #[error("Synthesis request already in flight")]
    Busy,

    // Playback Errors
    #[error("Playback error: {reason}")]
    Playback { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors (export side; load failures map to DocumentFormat)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ArithmusicError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ArithmusicError::Validation { .. } => "VALIDATION_ERROR",
            ArithmusicError::TrackNotFound { .. } => "TRACK_NOT_FOUND",
            ArithmusicError::SegmentNotFound { .. } => "SEGMENT_NOT_FOUND",
            ArithmusicError::UnknownSettingsField { .. } => "UNKNOWN_SETTINGS_FIELD",
            ArithmusicError::DocumentFormat { .. } => "DOCUMENT_FORMAT_ERROR",
            ArithmusicError::Checksum { .. } => "CHECKSUM_MISMATCH",
            ArithmusicError::Engine { .. } => "ENGINE_ERROR",
            ArithmusicError::Busy => "BUSY",
            ArithmusicError::Playback { .. } => "PLAYBACK_ERROR",
            ArithmusicError::Io(_) => "IO_ERROR",
            ArithmusicError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the composition untouched; the caller can
    /// fix the input (or retry after the in-flight request) and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ArithmusicError::Validation { .. }
                | ArithmusicError::DocumentFormat { .. }
                | ArithmusicError::Checksum { .. }
                | ArithmusicError::Engine { .. }
                | ArithmusicError::Busy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ArithmusicError::Busy;
        assert_eq!(err.error_code(), "BUSY");

        let err = ArithmusicError::DocumentFormat {
            field: "timelines".to_string(),
            reason: "expected array".to_string(),
        };
        assert_eq!(err.error_code(), "DOCUMENT_FORMAT_ERROR");
    }

    #[test]
    fn test_recoverability() {
        assert!(ArithmusicError::Busy.is_recoverable());
        assert!(ArithmusicError::Engine {
            reason: "null buffer descriptor".to_string()
        }
        .is_recoverable());
        assert!(!ArithmusicError::UnknownSettingsField {
            name: "tempo".to_string()
        }
        .is_recoverable());
    }
}
