//! Inference: the black-box regression model behind the service.
//!
//! The service only ever sees the [`Predictor`] trait. Concrete models are
//! loaded from a JSON artifact tagged by `kind`.

pub mod linear;
pub mod tree;

pub use linear::LinearModel;
pub use tree::{RegressionTree, TreeEnsemble, TreeNode};

use crate::error::MlError;
use crate::features::Encoder;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An opaque scoring function from a feature vector to a scalar.
pub trait Predictor: Send + Sync {
    /// Short model identifier for logs and health output.
    fn name(&self) -> &str;

    /// Width of the feature vector the model was trained on.
    fn n_features(&self) -> usize;

    /// Ordered training column names, when the artifact recorded them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Score one feature vector.
    fn predict(&self, features: &[f64]) -> Result<f64, MlError>;
}

/// Serialized model, discriminated by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    /// Check internal consistency and hand back a boxed predictor.
    pub fn into_predictor(self) -> Result<Box<dyn Predictor>, MlError> {
        match self {
            Self::Linear(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
            Self::TreeEnsemble(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
        }
    }
}

/// Load a model artifact from disk.
pub fn load_model(path: &Path) -> Result<Box<dyn Predictor>, MlError> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MlError::not_found(format!(
                "model file not found at {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let artifact: ModelArtifact = serde_json::from_slice(&content)
        .map_err(|e| MlError::model(format!("invalid model artifact {}: {e}", path.display())))?;
    let predictor = artifact.into_predictor()?;
    tracing::info!(
        path = %path.display(),
        model = predictor.name(),
        n_features = predictor.n_features(),
        "Loaded model artifact"
    );
    Ok(predictor)
}

/// Refuse to pair a model with an encoder it was not trained against.
///
/// Compares the full column list when the model recorded one, otherwise
/// only the width.
pub fn check_compatibility(predictor: &dyn Predictor, encoder: &Encoder) -> Result<(), MlError> {
    if let Some(names) = predictor.feature_names() {
        if names != encoder.feature_names() {
            let first_diff = names
                .iter()
                .zip(encoder.feature_names())
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| names.len().min(encoder.width()));
            return Err(MlError::model(format!(
                "model columns differ from encoder columns (model {} vs encoder {}, first difference at index {})",
                names.len(),
                encoder.width(),
                first_diff
            )));
        }
    }
    if predictor.n_features() != encoder.width() {
        return Err(MlError::model(format!(
            "model expects {} features, encoder produces {}",
            predictor.n_features(),
            encoder.width()
        )));
    }
    Ok(())
}

/// Reject vectors whose width does not match the model.
pub(crate) fn ensure_width(expected: usize, features: &[f64]) -> Result<(), MlError> {
    if features.len() != expected {
        return Err(MlError::inference(format!(
            "shape mismatch: model expects {} features, got {}",
            expected,
            features.len()
        )));
    }
    Ok(())
}
