//! Error types shared by all panelcut crates.

use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the optimizer.
///
/// Parts that cannot be placed are *not* errors: they are reported in
/// [`RunResult::unplaced`](crate::RunResult::unplaced). The geometry variants
/// ([`Error::OutOfBounds`], [`Error::Overlap`], [`Error::GrainViolation`]) signal a
/// packer defect and must never be retried or suppressed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// A configuration value is out of range or unknown.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Sheet dimensions or kerf are unusable.
    #[error("invalid sheet: {0}")]
    InvalidSheet(String),

    /// A part could not be used as packer input.
    #[error("invalid part: {0}")]
    InvalidPart(String),

    /// A placement extends past the sheet edge.
    #[error(
        "placement {instance} at ({x:.3}, {y:.3}) size {width:.3}x{height:.3} \
         exceeds sheet {sheet} ({sheet_width}x{sheet_height})"
    )]
    OutOfBounds {
        sheet: String,
        instance: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        sheet_width: f64,
        sheet_height: f64,
    },

    /// Two placements on the same sheet intersect.
    #[error("placements {first} and {second} overlap on sheet {sheet}")]
    Overlap {
        sheet: String,
        first: String,
        second: String,
    },

    /// A grain-locked part was placed rotated.
    #[error("grain-locked placement {instance} was rotated on sheet {sheet}")]
    GrainViolation { sheet: String, instance: String },

    /// No sheet with the given id exists in the result set.
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    /// No material group with the given key exists in the result set.
    #[error("material group not found: {0}")]
    GroupNotFound(String),

    /// Manual insertion would not fit on the target sheet alone.
    #[error(
        "manual insertion into {sheet} rejected: re-pack needs {sheets_needed} sheet(s) \
         and leaves {unplaced} part(s) unplaced"
    )]
    InsertionRejected {
        sheet: String,
        sheets_needed: usize,
        unplaced: usize,
    },

    /// Encoding or decoding of a message failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal failure (lock poisoning, worker shutdown, ...).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true for validator failures (overlap, bounds, grain).
    pub fn is_geometry_violation(&self) -> bool {
        matches!(
            self,
            Error::OutOfBounds { .. } | Error::Overlap { .. } | Error::GrainViolation { .. }
        )
    }
}
