use serde::Serialize;

use super::artifact::ArtifactPair;
use super::dataset::{load_dataset, LabeledDataset};
use super::forest::{ForestConfig, RandomForest};
use super::scaler::StandardScaler;
use super::smote::{oversample, SmoteConfig};
use crate::config::ModelPaths;
use crate::errors::TrainerError;
use crate::models::Feature;

#[derive(Debug, Clone, Default)]
pub struct TrainerConfig {
    pub forest: ForestConfig,
    pub smote: SmoteConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub rows: usize,
    /// (negatives, positives) as loaded
    pub class_counts: (usize, usize),
    /// (negatives, positives) after oversampling
    pub resampled_counts: (usize, usize),
    /// Accuracy on the resampled training set
    pub training_accuracy: f64,
    pub feature_importance: Vec<(String, f64)>,
}

/// Run the whole training pipeline on an in-memory dataset:
/// 1. Fit the scaler on the imputed features and standardize them
/// 2. Oversample the minority class (SMOTE)
/// 3. Fit the random forest
pub fn fit_pair(
    dataset: &LabeledDataset,
    config: &TrainerConfig,
) -> Result<(ArtifactPair, TrainingReport), TrainerError> {
    let names = Feature::names();

    let scaler = StandardScaler::fit(&dataset.features, names.clone());
    let scaled = scaler.transform(&dataset.features);

    let (x, y) = oversample(&scaled, &dataset.labels, &config.smote)?;

    let mut forest = RandomForest::new(config.forest.clone());
    forest.fit(&x, &y, names.clone());

    let correct = x
        .iter()
        .zip(&y)
        .filter(|(row, label)| forest.predict(row) == **label)
        .count();
    let resampled_pos = y.iter().filter(|&&l| l == 1).count();

    let report = TrainingReport {
        rows: dataset.n_samples(),
        class_counts: dataset.class_counts(),
        resampled_counts: (y.len() - resampled_pos, resampled_pos),
        training_accuracy: correct as f64 / y.len().max(1) as f64,
        feature_importance: names
            .into_iter()
            .zip(forest.feature_importances().iter().copied())
            .collect(),
    };

    Ok((ArtifactPair::new(forest, scaler), report))
}

/// Load the dataset from disk, train, and persist the model/scaler pair.
/// Any failure aborts the run; nothing is written unless training finished.
pub fn train(paths: &ModelPaths, config: &TrainerConfig) -> Result<TrainingReport, TrainerError> {
    let dataset = load_dataset(&paths.dataset)?;
    let (pair, report) = fit_pair(&dataset, config)?;
    pair.save(&paths.model, &paths.scaler)?;

    tracing::info!(
        rows = report.rows,
        accuracy = report.training_accuracy,
        "Training complete"
    );

    Ok(report)
}
