//! Binary classification tree (Gini impurity).

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{ModelError, validate_training_set};

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        /// Fraction of class-1 samples that reached this leaf
        prob_up: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        n_samples: usize,
        impurity: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct BestSplit {
    feature_idx: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
    gain: f64,
}

/// Decision Tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
    /// Unnormalized total weighted Gini decrease per feature
    gini_gain: Vec<f64>,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            gini_gain: Vec::new(),
        }
    }

    /// Train on every row of `features` / `labels`.
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<(), ModelError> {
        validate_training_set(features, labels)?;
        let indices: Vec<usize> = (0..features.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.fit_indices(features, labels, &indices, &mut rng);
        Ok(())
    }

    /// Train on the rows selected by `indices` (may repeat, as in a bootstrap sample).
    ///
    /// Inputs must already be validated.
    pub(crate) fn fit_indices(
        &mut self,
        features: &[Vec<f64>],
        labels: &[u8],
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) {
        let n_features = features.first().map_or(0, Vec::len);
        self.gini_gain = vec![0.0; n_features];
        self.root = Some(self.build_tree(features, labels, indices, 0, rng));
    }

    fn build_tree(
        &mut self,
        features: &[Vec<f64>],
        labels: &[u8],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let n_up = count_up(labels, indices);
        let impurity = gini(n_up, n);

        if depth >= self.config.max_depth || n < self.config.min_samples_split || impurity <= 0.0 {
            return leaf(n_up, n);
        }

        match self.find_best_split(features, labels, indices, impurity, rng) {
            Some(split) => {
                self.gini_gain[split.feature_idx] += split.gain * n as f64;

                let left = self.build_tree(features, labels, &split.left, depth + 1, rng);
                let right = self.build_tree(features, labels, &split.right, depth + 1, rng);

                TreeNode::Split {
                    feature_idx: split.feature_idx,
                    threshold: split.threshold,
                    n_samples: n,
                    impurity,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => leaf(n_up, n),
        }
    }

    /// Sweep each candidate feature in sorted order, testing midpoints between
    /// distinct consecutive values.
    fn find_best_split(
        &self,
        features: &[Vec<f64>],
        labels: &[u8],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n_features = features.first().map_or(0, Vec::len);
        let max_features = self
            .config
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features.max(1));

        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        feature_indices.shuffle(rng);
        feature_indices.truncate(max_features);

        let n = indices.len();
        let n_up_total = count_up(labels, indices);
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature_idx in &feature_indices {
            let mut sorted: Vec<usize> = indices.to_vec();
            sorted.sort_by(|&a, &b| features[a][feature_idx].total_cmp(&features[b][feature_idx]));

            let mut n_up_left = 0usize;
            for pos in 0..n - 1 {
                n_up_left += usize::from(labels[sorted[pos]] == 1);

                let current = features[sorted[pos]][feature_idx];
                let next = features[sorted[pos + 1]][feature_idx];
                if current == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let weighted = (n_left as f64 * gini(n_up_left, n_left)
                    + n_right as f64 * gini(n_up_total - n_up_left, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best.map_or(0.0, |(_, _, g)| g) {
                    // the midpoint of adjacent floats can round up to `next`
                    let mid = (current + next) / 2.0;
                    let threshold = if mid < next { mid } else { current };
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        let (feature_idx, threshold, gain) = best?;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| features[i][feature_idx] <= threshold);
        if left.len() < min_leaf || right.len() < min_leaf {
            return None;
        }
        Some(BestSplit {
            feature_idx,
            threshold,
            left,
            right,
            gain,
        })
    }

    /// Probability that a sample belongs to class 1. An unfitted tree answers 0.5.
    pub fn predict_proba_one(&self, x: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(node) => node,
            None => return 0.5,
        };
        loop {
            match node {
                TreeNode::Leaf { prob_up, .. } => return *prob_up,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if x[*feature_idx] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    /// Predicted class (0 or 1); a probability of exactly 0.5 maps to 0.
    pub fn predict_one(&self, x: &[f64]) -> u8 {
        u8::from(self.predict_proba_one(x) > 0.5)
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub(crate) fn gini_gain(&self) -> &[f64] {
        &self.gini_gain
    }
}

fn count_up(labels: &[u8], indices: &[usize]) -> usize {
    indices.iter().filter(|&&i| labels[i] == 1).count()
}

fn gini(n_up: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = n_up as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

fn leaf(n_up: usize, n: usize) -> TreeNode {
    let prob_up = if n == 0 { 0.5 } else { n_up as f64 / n as f64 };
    TreeNode::Leaf {
        prob_up,
        n_samples: n,
    }
}
