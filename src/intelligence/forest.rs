//! Random forest for binary classification.
//!
//! Gini-impurity CART trees on bootstrap samples, with class weights
//! recomputed for every bootstrap sample so each tree sees balanced classes.
//! Probabilities are the mean of per-tree leaf probabilities.

use rand::seq::index::sample;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Two values closer than this are treated as equal when placing splits.
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Random forest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (sqrt of total if None)
    pub max_features: Option<usize>,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        /// Weighted fraction of positive samples reaching this leaf
        proba: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted CART tree, nodes stored flat with the root at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    feature_importances: Vec<f64>,
}

/// Borrowed training data for one tree.
struct TreeData<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    weights: &'a [f64],
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Weighted child impurity: w_l * gini_l + w_r * gini_r
    child_impurity: f64,
}

impl DecisionTree {
    /// Fit on the rows with positive weight.
    fn fit(
        data: &TreeData<'_>,
        n_features: usize,
        config: &ForestConfig,
        max_features: usize,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            feature_importances: vec![0.0; n_features],
        };

        let indices: Vec<usize> = (0..data.x.len()).filter(|&i| data.weights[i] > 0.0).collect();
        if indices.is_empty() {
            tree.nodes.push(Node::Leaf { proba: 0.0 });
            return tree;
        }

        tree.grow(data, indices, 0, config, max_features, rng);

        let sum: f64 = tree.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut tree.feature_importances {
                *imp /= sum;
            }
        }

        tree
    }

    /// Build the subtree for `indices`, returning its node index.
    fn grow(
        &mut self,
        data: &TreeData<'_>,
        indices: Vec<usize>,
        depth: usize,
        config: &ForestConfig,
        max_features: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let (w_neg, w_pos) = class_weights(data, &indices);
        let total = w_neg + w_pos;
        let impurity = gini(w_neg, w_pos);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            proba: if total > 0.0 { w_pos / total } else { 0.0 },
        });

        if depth >= config.max_depth
            || indices.len() < config.min_samples_split
            || indices.len() < 2 * config.min_samples_leaf
            || impurity <= 0.0
        {
            return id;
        }

        let n_features = self.feature_importances.len();
        let candidates = sample(rng, n_features, max_features.min(n_features));

        let mut best: Option<SplitCandidate> = None;
        for feature in candidates.iter() {
            if let Some(c) = best_split_for_feature(data, &indices, feature, config.min_samples_leaf) {
                if best.as_ref().map_or(true, |b| c.child_impurity < b.child_impurity) {
                    best = Some(c);
                }
            }
        }

        let Some(split) = best else {
            return id;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| data.x[i][split.feature] <= split.threshold);

        self.feature_importances[split.feature] += total * impurity - split.child_impurity;

        let left = self.grow(data, left_idx, depth + 1, config, max_features, rng);
        let right = self.grow(data, right_idx, depth + 1, config, max_features, rng);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

/// Weighted (negative, positive) totals.
fn class_weights(data: &TreeData<'_>, indices: &[usize]) -> (f64, f64) {
    indices.iter().fold((0.0, 0.0), |(neg, pos), &i| {
        if data.y[i] == 1 {
            (neg, pos + data.weights[i])
        } else {
            (neg + data.weights[i], pos)
        }
    })
}

fn gini(w_neg: f64, w_pos: f64) -> f64 {
    let total = w_neg + w_pos;
    if total <= 0.0 {
        return 0.0;
    }
    let p = w_pos / total;
    let q = w_neg / total;
    1.0 - p * p - q * q
}

/// Sweep the sorted values of one feature and return the threshold with the
/// lowest weighted child impurity.
fn best_split_for_feature(
    data: &TreeData<'_>,
    indices: &[usize],
    feature: usize,
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let mut sorted: Vec<usize> = indices.to_vec();
    sorted.sort_by(|&a, &b| data.x[a][feature].total_cmp(&data.x[b][feature]));

    let (total_neg, total_pos) = class_weights(data, &sorted);
    let mut left_neg = 0.0;
    let mut left_pos = 0.0;
    let mut best: Option<SplitCandidate> = None;

    for pos in 0..sorted.len().saturating_sub(1) {
        let i = sorted[pos];
        if data.y[i] == 1 {
            left_pos += data.weights[i];
        } else {
            left_neg += data.weights[i];
        }

        let n_left = pos + 1;
        let n_right = sorted.len() - n_left;
        if n_left < min_samples_leaf || n_right < min_samples_leaf {
            continue;
        }

        let here = data.x[i][feature];
        let next = data.x[sorted[pos + 1]][feature];
        if next <= here + FEATURE_THRESHOLD {
            continue;
        }

        let right_neg = total_neg - left_neg;
        let right_pos = total_pos - left_pos;
        let child_impurity = (left_neg + left_pos) * gini(left_neg, left_pos)
            + (right_neg + right_pos) * gini(right_neg, right_pos);

        if best.as_ref().map_or(true, |b| child_impurity < b.child_impurity) {
            let mut threshold = here / 2.0 + next / 2.0;
            if threshold >= next || !threshold.is_finite() {
                threshold = here;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                child_impurity,
            });
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            feature_names: Vec::new(),
            trees: Vec::new(),
            feature_importances: Vec::new(),
        }
    }

    /// Train on `x` (rows) and binary labels `y`.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[u8], feature_names: Vec<String>) {
        let n_features = feature_names.len();
        let n_samples = x.len();
        self.feature_names = feature_names;

        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| ((n_features as f64).sqrt() as usize).max(1));

        let mut trees = Vec::with_capacity(self.config.n_trees);
        for t in 0..self.config.n_trees {
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(t as u64));
            let weights = balanced_bootstrap_weights(y, n_samples, &mut rng);
            let data = TreeData { x, y, weights: &weights };
            trees.push(DecisionTree::fit(&data, n_features, &self.config, max_features, &mut rng));
        }
        self.trees = trees;

        // Mean of per-tree importances, ignoring single-leaf trees
        self.feature_importances = vec![0.0; n_features];
        let grown: Vec<&DecisionTree> = self.trees.iter().filter(|t| t.n_nodes() > 1).collect();
        for tree in &grown {
            for (acc, imp) in self.feature_importances.iter_mut().zip(tree.feature_importances()) {
                *acc += imp;
            }
        }
        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }

        tracing::info!(
            trees = self.trees.len(),
            samples = n_samples,
            max_depth = self.config.max_depth,
            max_features,
            "Random forest trained"
        );
    }

    /// Positive-class probability for one scaled row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_proba(row)).sum::<f64>() / self.trees.len() as f64
    }

    /// Class decision: positive only when the positive probability is
    /// strictly greater than the negative one.
    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) > 0.5)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Mean decrease in impurity per feature, summing to 1.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

/// Bootstrap draw counts times per-sample class weights. Class weights are
/// `n / (2 * count)` over the bootstrap sample, so both classes carry equal
/// total weight in every tree.
fn balanced_bootstrap_weights(y: &[u8], n_samples: usize, rng: &mut ChaCha8Rng) -> Vec<f64> {
    let mut counts = vec![0u32; n_samples];
    for _ in 0..n_samples {
        counts[rng.gen_range(0..n_samples)] += 1;
    }

    let mut drawn = [0u64; 2];
    for (i, &c) in counts.iter().enumerate() {
        drawn[y[i] as usize] += u64::from(c);
    }

    let class_weight = |label: u8| {
        let count = drawn[label as usize];
        if count == 0 {
            0.0
        } else {
            n_samples as f64 / (2.0 * count as f64)
        }
    };

    counts
        .iter()
        .zip(y)
        .map(|(&c, &label)| f64::from(c) * class_weight(label))
        .collect()
}
