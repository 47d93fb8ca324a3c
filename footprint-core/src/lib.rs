//! # footprint-core: Carbon Footprint Estimation
//!
//! Turns a lifestyle questionnaire into an annual CO₂e estimate. A record is
//! validated against the field tables, normalized into a flat feature map,
//! encoded into the fixed column layout learned from the reference dataset,
//! and scored by a pre-trained regression model.
//!
//! ## Pipeline
//!
//! `StructuredRecord` → [`features::normalize`] → [`features::Encoder`] →
//! [`inference::Predictor`], orchestrated by [`service::PredictionService`]
//! and exposed over HTTP by [`gateway`].

// Foundation
pub mod config;
pub mod error;
pub mod persistence;
pub mod record;

// Data & features
pub mod data;
pub mod features;

// Serving
pub mod gateway;
pub mod inference;
pub mod service;

// Re-exports
pub use config::{ArtifactConfig, FootprintConfig, LoggingConfig, load_config};
pub use error::{FieldError, FieldErrorKind, MlError, ServiceError};
pub use features::{Encoder, EncoderStore};
pub use gateway::ServerConfig;
pub use inference::Predictor;
pub use record::{Selection, StructuredRecord};
pub use service::{PredictionResult, PredictionService, SharedService, bootstrap};
