//! SMOTE oversampling for the binary training set.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::errors::TrainerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoteConfig {
    /// Nearest minority neighbours to interpolate towards
    pub k_neighbors: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for SmoteConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
        }
    }
}

/// Balance the two classes by synthesizing minority samples.
///
/// Each synthetic sample sits on the segment between a random minority
/// sample and one of its k nearest minority neighbours. Originals are kept
/// in order; synthetic rows are appended after them.
pub fn oversample(
    features: &[Vec<f64>],
    labels: &[u8],
    config: &SmoteConfig,
) -> Result<(Vec<Vec<f64>>, Vec<u8>), TrainerError> {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;

    if positives == 0 || negatives == 0 {
        return Err(TrainerError::SingleClass(if positives == 0 { 0 } else { 1 }));
    }

    let (minority_label, n_needed) = if positives < negatives {
        (1u8, negatives - positives)
    } else {
        (0u8, positives - negatives)
    };

    let mut out_features = features.to_vec();
    let mut out_labels = labels.to_vec();

    if n_needed == 0 {
        return Ok((out_features, out_labels));
    }

    let minority: Vec<&Vec<f64>> = features
        .iter()
        .zip(labels)
        .filter(|(_, l)| **l == minority_label)
        .map(|(f, _)| f)
        .collect();

    if minority.len() < 2 {
        return Err(TrainerError::TooFewMinority(minority.len()));
    }

    let k = config.k_neighbors.min(minority.len() - 1).max(1);
    let neighbours = nearest_neighbours(&minority, k);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    for _ in 0..n_needed {
        let i = rng.gen_range(0..minority.len());
        let nn = neighbours[i][rng.gen_range(0..k)];
        let gap: f64 = rng.gen();

        let base = minority[i];
        let other = minority[nn];
        let synthetic = base
            .iter()
            .zip(other)
            .map(|(a, b)| a + gap * (b - a))
            .collect();

        out_features.push(synthetic);
        out_labels.push(minority_label);
    }

    tracing::info!(
        minority_label,
        minority = minority.len(),
        synthesized = n_needed,
        k,
        "SMOTE oversampling complete"
    );

    Ok((out_features, out_labels))
}

/// Indices of the `k` nearest other points (euclidean) for every point.
fn nearest_neighbours(points: &[&Vec<f64>], k: usize) -> Vec<Vec<usize>> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut dists: Vec<(f64, usize)> = points
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, q)| (squared_distance(p, q), j))
                .collect();
            dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
