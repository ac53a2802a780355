use std::path::Path;

use crate::errors::DatasetError;
use crate::models::Feature;

/// Label column in the training CSV.
pub const LABEL_COLUMN: &str = "labels";
/// Label value meaning "not a professional address".
pub const NEGATIVE_LABEL: &str = "No label";

/// Feature matrix plus binary labels, features in canonical order.
#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl LabeledDataset {
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    /// (negatives, positives)
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        (self.labels.len() - positives, positives)
    }
}

/// Load the labeled CSV: binarize `labels`, then fill missing feature values
/// with the column median over the whole file. Extra columns are ignored.
pub fn load_dataset(path: &Path) -> Result<LabeledDataset, DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(io_err)?;
    let headers = reader.headers().map_err(io_err)?.clone();

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let mut missing = Vec::new();
    let mut feature_idx = Vec::with_capacity(Feature::ALL.len());
    for feature in Feature::ALL {
        match position(feature.as_str()) {
            Some(i) => feature_idx.push(i),
            None => missing.push(feature.as_str().to_string()),
        }
    }
    let label_idx = position(LABEL_COLUMN);
    if label_idx.is_none() {
        missing.push(LABEL_COLUMN.to_string());
    }
    let label_idx = match label_idx {
        Some(i) if missing.is_empty() => i,
        _ => return Err(DatasetError::MissingColumns(missing)),
    };

    let mut dataset = LabeledDataset::default();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(io_err)?;

        let mut values = Vec::with_capacity(feature_idx.len());
        for (feature, &idx) in Feature::ALL.iter().zip(&feature_idx) {
            let raw = record.get(idx).unwrap_or("");
            let value = parse_cell(raw).ok_or_else(|| DatasetError::NotNumeric {
                row: row + 1,
                column: feature.as_str().to_string(),
                value: raw.to_string(),
            })?;
            values.push(value);
        }

        dataset.features.push(values);
        dataset.labels.push(binarize_label(record.get(label_idx).unwrap_or("")));
    }

    if dataset.features.is_empty() {
        return Err(DatasetError::Empty);
    }

    let medians = column_medians(&dataset.features, Feature::ALL.len());
    let mut fill = Vec::with_capacity(medians.len());
    for (feature, median) in Feature::ALL.iter().zip(medians) {
        fill.push(median.ok_or_else(|| DatasetError::EmptyColumn(feature.as_str().to_string()))?);
    }
    fill_missing(&mut dataset.features, &fill);

    let (neg, pos) = dataset.class_counts();
    tracing::info!(
        path = %path.display(),
        rows = dataset.n_samples(),
        negatives = neg,
        positives = pos,
        "Loaded training dataset"
    );

    Ok(dataset)
}

/// `"No label"` is the negative class; every other value is positive.
pub fn binarize_label(raw: &str) -> u8 {
    if raw == NEGATIVE_LABEL {
        0
    } else {
        1
    }
}

/// Cell spellings read as missing, compared case-insensitively. Same set
/// pandas treats as NA by default.
const MISSING_VALUES: &[&str] = &[
    "", "#n/a", "#n/a n/a", "#na", "-1.#ind", "-1.#qnan", "-nan", "1.#ind", "1.#qnan", "<na>",
    "n/a", "na", "null", "nan", "none",
];

/// Missing-value spellings become `f64::NAN`; anything else must parse.
fn parse_cell(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if MISSING_VALUES.iter().any(|m| raw.eq_ignore_ascii_case(m)) {
        return Some(f64::NAN);
    }
    raw.parse().ok()
}

/// Median of the non-NaN values, `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.total_cmp(b));

    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Per-column medians over all rows, ignoring NaN.
pub fn column_medians(rows: &[Vec<f64>], n_columns: usize) -> Vec<Option<f64>> {
    (0..n_columns)
        .map(|j| {
            let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
            median(&column)
        })
        .collect()
}

/// Replace every NaN in column `j` with `fill[j]`.
pub fn fill_missing(rows: &mut [Vec<f64>], fill: &[f64]) {
    for row in rows.iter_mut() {
        for (value, &replacement) in row.iter_mut().zip(fill) {
            if value.is_nan() {
                *value = replacement;
            }
        }
    }
}
