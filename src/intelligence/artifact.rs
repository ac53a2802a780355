use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::forest::RandomForest;
use super::scaler::StandardScaler;
use crate::errors::ArtifactError;

/// Persisted classifier. `pair_id` ties it to the scaler it was trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub pair_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub model: RandomForest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub pair_id: Uuid,
    pub scaler: StandardScaler,
}

/// A model and the scaler fitted on the same feature distribution.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    pub model: ModelArtifact,
    pub scaler: ScalerArtifact,
}

impl ArtifactPair {
    /// Wrap a freshly trained model and scaler under a new pair id.
    pub fn new(model: RandomForest, scaler: StandardScaler) -> Self {
        let pair_id = Uuid::new_v4();
        Self {
            model: ModelArtifact {
                pair_id,
                trained_at: Utc::now(),
                model,
            },
            scaler: ScalerArtifact { pair_id, scaler },
        }
    }

    /// Check that both halves belong together.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.model.pair_id != self.scaler.pair_id {
            return Err(ArtifactError::PairMismatch {
                model: self.model.pair_id,
                scaler: self.scaler.pair_id,
            });
        }

        let model_features = self.model.model.feature_names();
        let scaler_features = &self.scaler.scaler.feature_names;
        if model_features != scaler_features.as_slice()
            || self.scaler.scaler.n_features() != scaler_features.len()
        {
            return Err(ArtifactError::FeatureMismatch {
                model: model_features.to_vec(),
                scaler: scaler_features.clone(),
            });
        }

        Ok(())
    }

    /// Write both files. Re-running overwrites any previous pair.
    pub fn save(&self, model_path: &Path, scaler_path: &Path) -> Result<(), ArtifactError> {
        write_json(model_path, &self.model)?;
        write_json(scaler_path, &self.scaler)?;

        tracing::info!(
            pair_id = %self.model.pair_id,
            model = %model_path.display(),
            scaler = %scaler_path.display(),
            "Saved model and scaler"
        );
        Ok(())
    }

    /// Read both files and validate that they form a pair.
    pub fn load(model_path: &Path, scaler_path: &Path) -> Result<Self, ArtifactError> {
        let pair = Self {
            model: read_json(model_path)?,
            scaler: read_json(scaler_path)?,
        };
        pair.validate()?;

        tracing::debug!(
            pair_id = %pair.model.pair_id,
            trained_at = %pair.model.trained_at,
            "Loaded model and scaler"
        );
        Ok(pair)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let file = File::create(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| ArtifactError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Format {
        path: path.to_path_buf(),
        source,
    })
}
