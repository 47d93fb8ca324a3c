//! Fitted feature encoder: `NormalizedFeatureMap` → fixed-width vector.
//!
//! Column naming follows the dictionary-vectorizer convention the scoring
//! model was trained with. A category entry `key → value` becomes one-hot
//! column `key=value`; numbers and indicators keep their key as the column.
//! Columns are sorted at fit time and never change afterwards.

use crate::error::MlError;
use crate::features::normalize::{FeatureValue, NormalizedFeatureMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};

/// On-disk format version of [`EncoderArtifact`].
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Serialized encoder state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub fingerprint: String,
    pub fitted_at: DateTime<Utc>,
    pub fitted_rows: usize,
}

/// Vector produced for one record, with the columns it could not place.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub values: Vec<f64>,
    pub unseen: Vec<String>,
}

/// Immutable fitted encoder.
#[derive(Debug, Clone)]
pub struct Encoder {
    feature_names: Vec<String>,
    vocabulary: HashMap<String, usize>,
    fingerprint: String,
    fitted_at: DateTime<Utc>,
    fitted_rows: usize,
}

impl PartialEq for Encoder {
    fn eq(&self, other: &Self) -> bool {
        self.feature_names == other.feature_names
    }
}

/// Encoder column for one feature entry.
pub fn column_name(key: &str, value: &FeatureValue) -> String {
    match value {
        FeatureValue::Category(v) => format!("{key}={v}"),
        FeatureValue::Number(_) | FeatureValue::Indicator(_) => key.to_string(),
    }
}

/// SHA-256 over the ordered column names, hex encoded.
pub fn fingerprint_of(feature_names: &[String]) -> String {
    let mut hasher = Sha256::new();
    for name in feature_names {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl Encoder {
    /// Fit over every column observed in `rows`.
    pub fn fit<'a, I>(rows: I) -> Result<Self, MlError>
    where
        I: IntoIterator<Item = &'a NormalizedFeatureMap>,
    {
        let mut columns = BTreeSet::new();
        let mut fitted_rows = 0;
        for row in rows {
            fitted_rows += 1;
            for (key, value) in row.iter() {
                columns.insert(column_name(key, value));
            }
        }
        if fitted_rows == 0 {
            return Err(MlError::dataset("cannot fit encoder on zero rows"));
        }

        let mut encoder = Self::from_feature_names(columns.into_iter().collect())?;
        encoder.fitted_rows = fitted_rows;
        tracing::debug!(
            rows = fitted_rows,
            width = encoder.width(),
            "Fitted feature encoder"
        );
        Ok(encoder)
    }

    /// Build an encoder with an explicit column order.
    pub fn from_feature_names(feature_names: Vec<String>) -> Result<Self, MlError> {
        if feature_names.is_empty() {
            return Err(MlError::dataset("encoder must have at least one column"));
        }
        let mut vocabulary = HashMap::with_capacity(feature_names.len());
        for (index, name) in feature_names.iter().enumerate() {
            if vocabulary.insert(name.clone(), index).is_some() {
                return Err(MlError::dataset(format!("duplicate encoder column '{name}'")));
            }
        }
        let fingerprint = fingerprint_of(&feature_names);
        Ok(Self {
            feature_names,
            vocabulary,
            fingerprint,
            fitted_at: Utc::now(),
            fitted_rows: 0,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn fitted_at(&self) -> DateTime<Utc> {
        self.fitted_at
    }

    pub fn fitted_rows(&self) -> usize {
        self.fitted_rows
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.vocabulary.get(column).copied()
    }

    /// Encode a map, reporting columns absent from the vocabulary.
    ///
    /// Unseen columns are dropped, never rejected: an unknown category
    /// simply leaves its one-hot block all zero.
    pub fn encode(&self, map: &NormalizedFeatureMap) -> Encoded {
        let mut values = vec![0.0; self.width()];
        let mut unseen = Vec::new();
        for (key, value) in map.iter() {
            let column = column_name(key, value);
            match self.vocabulary.get(&column) {
                Some(&index) => values[index] = value.as_f64(),
                None => unseen.push(column),
            }
        }
        Encoded { values, unseen }
    }

    /// Encode a map into the fixed-width vector, dropping unseen columns.
    pub fn transform(&self, map: &NormalizedFeatureMap) -> Vec<f64> {
        self.encode(map).values
    }

    pub fn to_artifact(&self) -> EncoderArtifact {
        EncoderArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: self.feature_names.clone(),
            fingerprint: self.fingerprint.clone(),
            fitted_at: self.fitted_at,
            fitted_rows: self.fitted_rows,
        }
    }

    /// Restore from an artifact, verifying version and fingerprint.
    pub fn from_artifact(artifact: EncoderArtifact) -> Result<Self, MlError> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(MlError::corrupt_artifact(format!(
                "unsupported format version {} (expected {})",
                artifact.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        let computed = fingerprint_of(&artifact.feature_names);
        if computed != artifact.fingerprint {
            return Err(MlError::corrupt_artifact(format!(
                "fingerprint mismatch: stored {}, computed {}",
                artifact.fingerprint, computed
            )));
        }
        let mut encoder = Self::from_feature_names(artifact.feature_names)
            .map_err(|e| MlError::corrupt_artifact(e.to_string()))?;
        encoder.fitted_at = artifact.fitted_at;
        encoder.fitted_rows = artifact.fitted_rows;
        Ok(encoder)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MlError> {
        Ok(serde_json::to_vec_pretty(&self.to_artifact())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MlError> {
        let artifact: EncoderArtifact = serde_json::from_slice(bytes)
            .map_err(|e| MlError::corrupt_artifact(format!("undecodable artifact: {e}")))?;
        Self::from_artifact(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::normalize::normalize;
    use crate::record::Selection;
    use crate::record::fixtures::example_record;

    fn small_map(shower: &str, bill: f64) -> NormalizedFeatureMap {
        let mut map = NormalizedFeatureMap::new();
        map.insert("shower", FeatureValue::Category(shower.into()));
        map.insert("monthly_grocery_bill", FeatureValue::Number(bill));
        map.insert("recycling_paper", FeatureValue::Indicator(true));
        map
    }

    #[test]
    fn test_fit_sorts_columns() {
        let rows = [small_map("daily", 100.0), small_map("twice a day", 50.0)];
        let encoder = Encoder::fit(&rows).unwrap();
        assert_eq!(
            encoder.feature_names(),
            &[
                "monthly_grocery_bill",
                "recycling_paper",
                "shower=daily",
                "shower=twice a day"
            ]
        );
        assert_eq!(encoder.fitted_rows(), 2);
    }

    #[test]
    fn test_fit_rejects_empty() {
        let rows: Vec<NormalizedFeatureMap> = Vec::new();
        assert!(Encoder::fit(&rows).is_err());
    }

    #[test]
    fn test_transform_places_values() {
        let rows = [small_map("daily", 100.0), small_map("twice a day", 50.0)];
        let encoder = Encoder::fit(&rows).unwrap();
        let vector = encoder.transform(&small_map("twice a day", 75.5));
        assert_eq!(vector, vec![75.5, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unseen_category_dropped() {
        let rows = [small_map("daily", 100.0)];
        let encoder = Encoder::fit(&rows).unwrap();
        let encoded = encoder.encode(&small_map("hourly", 10.0));
        assert_eq!(encoded.values, vec![10.0, 1.0, 0.0]);
        assert_eq!(encoded.unseen, vec!["shower=hourly"]);
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = Encoder::from_feature_names(vec!["a".into(), "a".into()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_artifact_roundtrip_identical_transform() {
        let mut other = example_record();
        other.recycling = Selection::List(vec![]);
        other.diet = "vegan".into();
        let rows = [normalize(&example_record()), normalize(&other)];
        let encoder = Encoder::fit(&rows).unwrap();

        let restored = Encoder::from_bytes(&encoder.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, encoder);
        assert_eq!(restored.fingerprint(), encoder.fingerprint());
        assert_eq!(restored.fitted_at(), encoder.fitted_at());
        for row in &rows {
            assert_eq!(restored.transform(row), encoder.transform(row));
        }
    }

    #[test]
    fn test_tampered_artifact_is_corrupt() {
        let encoder = Encoder::fit(&[small_map("daily", 1.0)]).unwrap();
        let mut artifact = encoder.to_artifact();
        artifact.feature_names.reverse();
        let err = Encoder::from_artifact(artifact).unwrap_err();
        assert!(matches!(err, MlError::CorruptArtifact(_)));
    }

    #[test]
    fn test_garbage_bytes_are_corrupt() {
        let err = Encoder::from_bytes(b"\x00\x01not json").unwrap_err();
        assert!(matches!(err, MlError::CorruptArtifact(_)));
    }

    #[test]
    fn test_wrong_version_is_corrupt() {
        let encoder = Encoder::fit(&[small_map("daily", 1.0)]).unwrap();
        let mut artifact = encoder.to_artifact();
        artifact.format_version = 99;
        assert!(matches!(
            Encoder::from_artifact(artifact),
            Err(MlError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_fingerprint_depends_on_order() {
        let a = fingerprint_of(&["x".into(), "y".into()]);
        let b = fingerprint_of(&["y".into(), "x".into()]);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
