//! Error types for the footprint-core crate.

use serde::Serialize;
use thiserror::Error;

/// Errors raised while loading artifacts, reading data, or scoring.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Reference dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Corrupt encoder artifact: {0}")]
    CorruptArtifact(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl MlError {
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn corrupt_artifact(msg: impl Into<String>) -> Self {
        Self::CorruptArtifact(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// A single offending field in a rejected record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub kind: FieldErrorKind,
}

/// Classification of a field-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// Categorical value outside its enumeration.
    Enum,
    /// Numeric value outside its bounds.
    Range,
    /// NaN or infinite number.
    NotFinite,
    /// Fractional value for a count field.
    NotInteger,
    /// Multi-select option outside its universe.
    Option,
    /// Body could not be decoded into a record at all.
    Decode,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind,
        }
    }
}

/// Outcome of a failed prediction request.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Internal error: {0}")]
    Internal(#[from] MlError),
}

impl ServiceError {
    /// Field errors, if this is a validation failure.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Internal(_) => None,
        }
    }
}
