use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading and preparing the labeled training CSV.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: column {column} is not numeric: {value:?}")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("column {0} has no values to compute a median from")]
    EmptyColumn(String),

    #[error("dataset has no rows")]
    Empty,
}

/// Errors raised while writing or reading the model/scaler artifact pair.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {path} is not valid: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model (pair {model}) and scaler (pair {scaler}) were not trained together")]
    PairMismatch { model: uuid::Uuid, scaler: uuid::Uuid },

    #[error("model features {model:?} do not match scaler features {scaler:?}")]
    FeatureMismatch {
        model: Vec<String>,
        scaler: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("training data contains a single class ({0}); need both labels")]
    SingleClass(u8),

    #[error("minority class has {0} sample(s); oversampling needs at least 2")]
    TooFewMinority(usize),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("missing required features: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    #[error("feature {0} has no usable value after imputation")]
    NonFiniteFeature(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Failure of one explorer request. Ends pagination; collected records are kept.
#[derive(Debug, Error)]
pub enum EtherscanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// Per-record transformation failure. The record is skipped, the run goes on.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("field {field} is not an integer: {value:?}")]
    NotInteger { field: &'static str, value: String },

    #[error("value {0} does not fit in uint256")]
    ValueOutOfRange(String),

    #[error("undecodable transfer record: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush csv: {0}")]
    Io(#[from] std::io::Error),
}
