use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactPair;
use super::dataset::{column_medians, fill_missing};
use super::forest::RandomForest;
use super::scaler::StandardScaler;
use crate::errors::ClassifierError;

/// Classification result for one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub is_professional: bool,
    /// Positive-class probability, rounded to 4 decimals.
    pub probability: f64,
    /// Model-wide importances; the same for every input.
    pub feature_importance: BTreeMap<String, f64>,
}

impl Prediction {
    /// Importances, largest first.
    pub fn sorted_importance(&self) -> Vec<(&str, f64)> {
        let mut items: Vec<(&str, f64)> = self
            .feature_importance
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        items.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(b.0)));
        items
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Professional user: {}",
            if self.is_professional { "yes" } else { "no" }
        )?;
        writeln!(f, "Probability:       {:.2}%", self.probability * 100.0)?;
        writeln!(f)?;
        write!(f, "Feature importance:")?;
        for (name, importance) in self.sorted_importance() {
            write!(f, "\n{name:20}: {importance:.4}")?;
        }
        Ok(())
    }
}

/// Professional-address classifier backed by a trained model/scaler pair.
pub struct ProfessionalClassifier {
    model: RandomForest,
    scaler: StandardScaler,
}

impl ProfessionalClassifier {
    /// Build from an already loaded pair. Fails if the halves do not match.
    pub fn new(pair: ArtifactPair) -> Result<Self, ClassifierError> {
        pair.validate()?;
        Ok(Self {
            model: pair.model.model,
            scaler: pair.scaler.scaler,
        })
    }

    /// Load both artifacts from disk.
    pub fn from_files(model_path: &Path, scaler_path: &Path) -> Result<Self, ClassifierError> {
        Self::new(ArtifactPair::load(model_path, scaler_path)?)
    }

    pub fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }

    /// Classify one address given its named features.
    ///
    /// Every model feature must be present as a key; extra keys are ignored.
    /// NaN values go through the same median fill as training, computed over
    /// this single row, so they cannot be recovered and are rejected.
    pub fn predict(&self, input: &HashMap<String, f64>) -> Result<Prediction, ClassifierError> {
        let names = self.feature_names();

        let missing: Vec<String> = names
            .iter()
            .filter(|name| !input.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ClassifierError::MissingFeatures(missing));
        }

        let mut rows = vec![names.iter().map(|name| input[name.as_str()]).collect::<Vec<f64>>()];

        // Per-row medians: for one row this is the row itself
        let medians = column_medians(&rows, names.len());
        let fill: Vec<f64> = medians.into_iter().map(|m| m.unwrap_or(f64::NAN)).collect();
        fill_missing(&mut rows, &fill);

        let row = &rows[0];
        if let Some(idx) = row.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteFeature(names[idx].clone()));
        }

        let scaled = self.scaler.transform_row(row);
        let probability = self.model.predict_proba(&scaled);

        Ok(Prediction {
            is_professional: self.model.predict(&scaled) == 1,
            probability: round4(probability),
            feature_importance: self.feature_importance(),
        })
    }

    pub fn feature_importance(&self) -> BTreeMap<String, f64> {
        self.feature_names()
            .iter()
            .cloned()
            .zip(self.model.feature_importances().iter().copied())
            .collect()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
