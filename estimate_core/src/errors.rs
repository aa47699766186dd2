//! # Error Types
//!
//! Structured error types for estimate_core. Every failure the engine can
//! produce is a local validation failure: it is detected before any
//! arithmetic touches the offending value and surfaces as a single typed
//! error, never a partial result.
//!
//! ## Example
//!
//! ```rust
//! use estimate_core::errors::{CalcError, CalcResult};
//!
//! fn validate_length(length_ft: f64) -> CalcResult<()> {
//!     if length_ft <= 0.0 {
//!         return Err(CalcError::validation(
//!             "length",
//!             length_ft.to_string(),
//!             "Length must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_length(0.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for estimate_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for estimation operations.
///
/// The first four variants are the engine's error taxonomy; the rest only
/// occur while loading a catalog or settings snapshot.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A measurement is missing, non-positive, or malformed (inches >= 12)
    #[error("Invalid value for '{field}': {value} - {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    /// The requested material id is not in the catalog snapshot
    #[error("Material not found: {material_id}")]
    MaterialNotFound { material_id: String },

    /// No material dimension and no nominal default exists for a layer
    #[error("No depth available for layer '{layer}'")]
    MissingLayerDepth { layer: String },

    /// A coverage, weight, or unit ratio resolved to zero or less
    #[error("Invalid coverage factor '{factor}': {value}")]
    InvalidCoverageFactor { factor: String, value: String },

    /// Two catalog entries share an id
    #[error("Duplicate material id in catalog: {material_id}")]
    DuplicateMaterial { material_id: String },

    /// File I/O error while reading a catalog or settings file
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create a Validation error
    pub fn validation(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Validation {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MaterialNotFound error
    pub fn material_not_found(material_id: impl Into<String>) -> Self {
        CalcError::MaterialNotFound {
            material_id: material_id.into(),
        }
    }

    /// Create a MissingLayerDepth error
    pub fn missing_layer_depth(layer: impl Into<String>) -> Self {
        CalcError::MissingLayerDepth { layer: layer.into() }
    }

    /// Create an InvalidCoverageFactor error
    pub fn invalid_coverage(factor: impl Into<String>, value: f64) -> Self {
        CalcError::InvalidCoverageFactor {
            factor: factor.into(),
            value: value.to_string(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        CalcError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::Validation { .. } => "VALIDATION_ERROR",
            CalcError::MaterialNotFound { .. } => "MATERIAL_NOT_FOUND",
            CalcError::MissingLayerDepth { .. } => "MISSING_LAYER_DEPTH",
            CalcError::InvalidCoverageFactor { .. } => "INVALID_COVERAGE_FACTOR",
            CalcError::DuplicateMaterial { .. } => "DUPLICATE_MATERIAL",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// HTTP status the API boundary should answer with.
    ///
    /// Every engine error is a client-side problem with the request or the
    /// supplied catalog, so all of them map to 400.
    pub fn http_status(&self) -> u16 {
        match self {
            CalcError::Validation { .. }
            | CalcError::MaterialNotFound { .. }
            | CalcError::MissingLayerDepth { .. }
            | CalcError::InvalidCoverageFactor { .. }
            | CalcError::DuplicateMaterial { .. }
            | CalcError::FileError { .. }
            | CalcError::SerializationError { .. } => 400,
        }
    }
}

/// Divide by a coverage or ratio factor, refusing zero, negative, or
/// non-finite divisors.
///
/// All quantity math that divides by a catalog or settings factor goes
/// through here; layer depths are never divisors.
pub fn guarded_div(numerator: f64, factor: f64, factor_name: &str) -> CalcResult<f64> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(CalcError::invalid_coverage(factor_name, factor));
    }
    Ok(numerator / factor)
}

/// Reject a derived amount that overflowed to infinity or went NaN.
pub fn ensure_finite(field: &str, value: f64) -> CalcResult<f64> {
    if !value.is_finite() {
        return Err(CalcError::validation(
            field,
            value.to_string(),
            "Measurements are too large to estimate",
        ));
    }
    Ok(value)
}
