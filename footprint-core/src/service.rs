//! Prediction service: validate → normalize → encode → score.
//!
//! [`PredictionService`] is the process-wide state. It is built once by
//! [`bootstrap`] before the listener binds, then shared read-only (behind an
//! `Arc`) by every request for the lifetime of the process.

use crate::config::ArtifactConfig;
use crate::error::{MlError, ServiceError};
use crate::features::{Encoder, EncoderOrigin, EncoderStore, normalize};
use crate::inference::{self, Predictor};
use crate::record::StructuredRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Successful prediction: the score plus the accepted input, echoed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Estimated annual emissions, kg CO₂e.
    pub prediction: f64,
    pub input: StructuredRecord,
}

/// Shared handle passed to HTTP handlers.
pub type SharedService = Arc<PredictionService>;

pub struct PredictionService {
    encoder: Encoder,
    predictor: Box<dyn Predictor>,
    started_at: DateTime<Utc>,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("model", &self.predictor.name())
            .field("encoder_width", &self.encoder.width())
            .field("fingerprint", &self.encoder.fingerprint())
            .finish()
    }
}

impl PredictionService {
    /// Pair an encoder with a model, refusing mismatched column layouts.
    pub fn new(encoder: Encoder, predictor: Box<dyn Predictor>) -> Result<Self, MlError> {
        inference::check_compatibility(predictor.as_ref(), &encoder)?;
        Ok(Self {
            encoder,
            predictor,
            started_at: Utc::now(),
        })
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Score one record.
    ///
    /// Validation failures are reported per field and never coerced.
    /// Columns unknown to the encoder are dropped with a warning. Predictor
    /// failures surface as [`ServiceError::Internal`]; nothing is retried.
    pub fn predict(&self, record: StructuredRecord) -> Result<PredictionResult, ServiceError> {
        record.validate().map_err(ServiceError::Validation)?;

        let features = normalize(&record);
        let encoded = self.encoder.encode(&features);
        if !encoded.unseen.is_empty() {
            tracing::warn!(
                unseen = ?encoded.unseen,
                "Dropped feature columns absent from the encoder vocabulary"
            );
        }

        let prediction = self.predictor.predict(&encoded.values)?;
        if !prediction.is_finite() {
            return Err(MlError::inference(format!(
                "model {} produced non-finite output {prediction}",
                self.predictor.name()
            ))
            .into());
        }

        tracing::debug!(prediction, "Scored record");
        Ok(PredictionResult {
            prediction,
            input: record,
        })
    }
}

/// Build the process-wide service from artifact locations.
///
/// Initializes the encoder store (loading, or fitting and persisting) and
/// loads the model, then checks they agree on the column layout.
pub async fn bootstrap(artifacts: &ArtifactConfig) -> Result<PredictionService, MlError> {
    let store = EncoderStore::with_csv(&artifacts.encoder_path, &artifacts.dataset_path);
    let (encoder, origin) = store.initialize().await?;
    match origin {
        EncoderOrigin::Loaded => {}
        EncoderOrigin::Fitted {
            persisted,
            replaced_corrupt,
        } => tracing::info!(persisted, replaced_corrupt, "Encoder fitted at startup"),
    }

    let predictor = inference::load_model(&artifacts.model_path)?;
    let service = PredictionService::new(encoder, predictor)?;
    tracing::info!(service = ?service, "Prediction service ready");
    Ok(service)
}
