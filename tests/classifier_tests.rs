mod common;

use std::collections::HashMap;
use std::path::Path;

use tempfile::TempDir;

use common::write_dataset;
use ethprofile::config::ModelPaths;
use ethprofile::errors::{ArtifactError, ClassifierError, DatasetError, TrainerError};
use ethprofile::intelligence::{train, ForestConfig, ProfessionalClassifier, TrainerConfig};
use ethprofile::models::FeatureVector;

fn small_config() -> TrainerConfig {
    TrainerConfig {
        forest: ForestConfig {
            n_trees: 15,
            max_depth: 6,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn paths_in(dir: &Path, tag: &str) -> ModelPaths {
    ModelPaths {
        dataset: dir.join("dataset.csv"),
        model: dir.join(format!("model_{tag}.json")),
        scaler: dir.join(format!("scaler_{tag}.json")),
    }
}

fn professional_input() -> HashMap<String, f64> {
    FeatureVector {
        balance_ether: 10.0,
        total_transactions: 10_000.0,
        sent: 5_000.0,
        received: 5_000.0,
        n_contracts_sent: 1.0,
        n_contracts_received: 0.0,
    }
    .to_map()
}

fn casual_input() -> HashMap<String, f64> {
    FeatureVector {
        balance_ether: 10.0,
        total_transactions: 4.0,
        sent: 2.0,
        received: 2.0,
        n_contracts_sent: 1.0,
        n_contracts_received: 2.0,
    }
    .to_map()
}

#[test]
fn test_train_then_predict_from_files() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(dir.path(), "a");
    write_dataset(&paths.dataset, 30);

    let report = train(&paths, &small_config()).expect("training should succeed");
    assert_eq!(report.rows, 30);
    assert_eq!(report.class_counts, (20, 10));
    assert_eq!(report.resampled_counts, (20, 20));
    assert!(report.training_accuracy > 0.9);
    assert!(paths.model.exists());
    assert!(paths.scaler.exists());

    let clf = ProfessionalClassifier::from_files(&paths.model, &paths.scaler).unwrap();

    let pro = clf.predict(&professional_input()).unwrap();
    assert!((0.0..=1.0).contains(&pro.probability));
    assert!(pro.is_professional);

    let casual = clf.predict(&casual_input()).unwrap();
    assert!(!casual.is_professional);
    assert!(casual.probability < pro.probability);
}

#[test]
fn test_reloaded_model_matches_report_importance() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(dir.path(), "a");
    write_dataset(&paths.dataset, 30);

    let report = train(&paths, &small_config()).unwrap();
    let clf = ProfessionalClassifier::from_files(&paths.model, &paths.scaler).unwrap();

    let loaded = clf.feature_importance();
    for (name, importance) in &report.feature_importance {
        assert_eq!(loaded[name], *importance);
    }
}

#[test]
fn test_missing_sent_is_reported_by_name() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(dir.path(), "a");
    write_dataset(&paths.dataset, 30);
    train(&paths, &small_config()).unwrap();
    let clf = ProfessionalClassifier::from_files(&paths.model, &paths.scaler).unwrap();

    let mut input = casual_input();
    input.remove("sent");

    let err = clf.predict(&input).unwrap_err();
    assert!(matches!(err, ClassifierError::MissingFeatures(ref names) if names == &["sent".to_string()]));
    assert!(err.to_string().contains("sent"));
}

#[test]
fn test_mismatched_pair_rejected() {
    let dir = TempDir::new().unwrap();
    let first = paths_in(dir.path(), "a");
    let second = paths_in(dir.path(), "b");
    write_dataset(&first.dataset, 30);

    train(&first, &small_config()).unwrap();
    train(&second, &small_config()).unwrap();

    let result = ProfessionalClassifier::from_files(&first.model, &second.scaler);
    assert!(matches!(
        result,
        Err(ClassifierError::Artifact(ArtifactError::PairMismatch { .. }))
    ));
}

#[test]
fn test_missing_artifact_file() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(dir.path(), "none");

    let result = ProfessionalClassifier::from_files(&paths.model, &paths.scaler);
    assert!(matches!(result, Err(ClassifierError::Artifact(ArtifactError::Io { .. }))));
}

#[test]
fn test_single_class_dataset_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(dir.path(), "a");
    std::fs::write(
        &paths.dataset,
        "balance_ether,total_transactions,sent,received,n_contracts_sent,n_contracts_received,labels\n\
         1,2,1,1,0,0,No label\n\
         2,4,2,2,1,0,No label\n\
         3,6,3,3,0,1,No label\n",
    )
    .unwrap();

    let result = train(&paths, &small_config());
    assert!(matches!(result, Err(TrainerError::SingleClass(0))));
    assert!(!paths.model.exists());
    assert!(!paths.scaler.exists());
}

#[test]
fn test_dataset_missing_label_column() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(dir.path(), "a");
    std::fs::write(
        &paths.dataset,
        "balance_ether,total_transactions,sent,received,n_contracts_sent,n_contracts_received\n1,2,1,1,0,0\n",
    )
    .unwrap();

    match train(&paths, &small_config()) {
        Err(TrainerError::Dataset(DatasetError::MissingColumns(cols))) => {
            assert_eq!(cols, vec!["labels".to_string()]);
        }
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}
