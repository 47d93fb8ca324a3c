//! Encoder store: load the persisted encoder, or fit and persist a new one.
//!
//! Runs once at startup, before the listener is bound. A corrupt artifact is
//! never fatal (we rebuild), and neither is a failed write (we keep serving
//! from the in-memory encoder).

use crate::data::reference::ReferenceDataset;
use crate::data::source::{CsvSource, DataSource};
use crate::error::MlError;
use crate::features::encoder::Encoder;
use crate::features::normalize::normalize;
use crate::persistence;
use std::path::{Path, PathBuf};

/// How the encoder returned by [`EncoderStore::initialize`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderOrigin {
    /// Deserialized from the persisted artifact.
    Loaded,
    /// Fit from the reference dataset. `persisted` is false when the
    /// artifact could not be written.
    Fitted { persisted: bool, replaced_corrupt: bool },
}

pub struct EncoderStore {
    artifact_path: PathBuf,
    source: Box<dyn DataSource>,
}

impl EncoderStore {
    pub fn new(artifact_path: impl Into<PathBuf>, source: Box<dyn DataSource>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            source,
        }
    }

    /// Store backed by a CSV reference dataset.
    pub fn with_csv(artifact_path: impl Into<PathBuf>, dataset_path: impl Into<PathBuf>) -> Self {
        Self::new(artifact_path, Box::new(CsvSource::new(dataset_path)))
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Return a ready encoder, loading the artifact when possible.
    pub async fn initialize(&self) -> Result<(Encoder, EncoderOrigin), MlError> {
        let mut replaced_corrupt = false;
        match self.load() {
            Ok(Some(encoder)) => {
                tracing::info!(
                    path = %self.artifact_path.display(),
                    width = encoder.width(),
                    fingerprint = %encoder.fingerprint(),
                    "Loaded encoder artifact"
                );
                return Ok((encoder, EncoderOrigin::Loaded));
            }
            Ok(None) => {
                tracing::info!(
                    path = %self.artifact_path.display(),
                    "No encoder artifact found, fitting from reference dataset"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.artifact_path.display(),
                    error = %e,
                    "Encoder artifact unusable, rebuilding from reference dataset"
                );
                replaced_corrupt = true;
            }
        }

        let encoder = self.fit().await?;
        let persisted = match self.persist(&encoder) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    path = %self.artifact_path.display(),
                    error = %e,
                    "Failed to persist encoder artifact, continuing with in-memory encoder"
                );
                false
            }
        };
        Ok((
            encoder,
            EncoderOrigin::Fitted {
                persisted,
                replaced_corrupt,
            },
        ))
    }

    /// Fit from the reference dataset and overwrite the artifact.
    ///
    /// Unlike [`initialize`](Self::initialize), a failed write is an error.
    pub async fn rebuild(&self) -> Result<Encoder, MlError> {
        let encoder = self.fit().await?;
        self.persist(&encoder)?;
        Ok(encoder)
    }

    /// Read the artifact. `Ok(None)` if absent; `CorruptArtifact` if unreadable.
    pub fn load(&self) -> Result<Option<Encoder>, MlError> {
        let bytes = persistence::read_if_exists(&self.artifact_path)
            .map_err(|e| MlError::corrupt_artifact(format!("unreadable artifact: {e}")))?;
        bytes.map(|b| Encoder::from_bytes(&b)).transpose()
    }

    async fn fit(&self) -> Result<Encoder, MlError> {
        let dataset = ReferenceDataset::load(self.source.as_ref()).await?;
        let maps: Vec<_> = dataset.records.iter().map(normalize).collect();
        let encoder = Encoder::fit(&maps)?;
        tracing::info!(
            rows = dataset.len(),
            width = encoder.width(),
            fingerprint = %encoder.fingerprint(),
            "Fitted encoder from reference dataset"
        );
        Ok(encoder)
    }

    fn persist(&self, encoder: &Encoder) -> Result<(), MlError> {
        persistence::atomic_write_json(&self.artifact_path, &encoder.to_artifact())?;
        tracing::info!(path = %self.artifact_path.display(), "Persisted encoder artifact");
        Ok(())
    }
}
