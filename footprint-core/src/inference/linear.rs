//! Linear regression model.

use super::{Predictor, ensure_width};
use crate::error::MlError;
use serde::{Deserialize, Serialize};

/// `intercept + Σ coefficient_i · x_i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LinearModel {
    pub fn validate(&self) -> Result<(), MlError> {
        if self.coefficients.is_empty() {
            return Err(MlError::model("linear model has no coefficients"));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(MlError::model("linear model has non-finite parameters"));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.coefficients.len() {
                return Err(MlError::model(format!(
                    "linear model lists {} feature names for {} coefficients",
                    names.len(),
                    self.coefficients.len()
                )));
            }
        }
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn name(&self) -> &str {
        "linear"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, MlError> {
        ensure_width(self.coefficients.len(), features)?;
        let score = self
            .coefficients
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (c, x)| acc + c * x);
        Ok(score)
    }
}
