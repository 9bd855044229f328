//! Random forest binary classifier.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision_tree::{DecisionTree, TreeConfig};
use super::{ModelError, validate_training_set};

/// Random Forest configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features tried per split (ceil(sqrt(n_features)) if None)
    pub max_features: Option<usize>,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Random Forest model
///
/// Fitting consumes no shared state; a fitted forest is immutable and can be
/// used from several threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
    n_features: usize,
}

impl RandomForest {
    /// Fit a forest on `features` (one row per sample) and binary `labels`.
    pub fn fit(
        config: ForestConfig,
        features: &[Vec<f64>],
        labels: &[u8],
    ) -> Result<Self, ModelError> {
        let n_features = validate_training_set(features, labels)?;
        let n_samples = features.len();

        let max_features = config
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .max(1);

        let mut trees = Vec::with_capacity(config.n_trees);
        for i in 0..config.n_trees {
            let tree_seed = config.seed.wrapping_add(i as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);

            let indices: Vec<usize> = if config.bootstrap {
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
            } else {
                (0..n_samples).collect()
            };

            let mut tree = DecisionTree::new(TreeConfig {
                max_depth: config.max_depth,
                min_samples_split: config.min_samples_split,
                min_samples_leaf: config.min_samples_leaf,
                max_features: Some(max_features),
                seed: tree_seed,
            });
            tree.fit_indices(features, labels, &indices, &mut rng);
            trees.push(tree);
        }

        // Aggregate feature importances
        let mut feature_importances = vec![0.0; n_features];
        for tree in &trees {
            let gains = tree.gini_gain();
            let total: f64 = gains.iter().sum();
            if total > 0.0 {
                for (imp, &g) in feature_importances.iter_mut().zip(gains) {
                    *imp += g / total;
                }
            }
        }

        // Normalize
        let sum: f64 = feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut feature_importances {
                *imp /= sum;
            }
        }

        debug!(
            n_trees = trees.len(),
            n_samples,
            n_features,
            max_features,
            "random forest fitted"
        );

        Ok(RandomForest {
            config,
            trees,
            feature_importances,
            n_features,
        })
    }

    /// Mean class-1 probability across trees.
    pub fn predict_proba_one(&self, x: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        self.trees.iter().map(|t| t.predict_proba_one(x)).sum::<f64>() / self.trees.len() as f64
    }

    /// Predicted class (0 or 1); ties at 0.5 go to 0.
    pub fn predict_one(&self, x: &[f64]) -> u8 {
        u8::from(self.predict_proba_one(x) > 0.5)
    }

    pub fn predict(&self, features: &[Vec<f64>]) -> Vec<u8> {
        features.iter().map(|x| self.predict_one(x)).collect()
    }

    /// Normalized mean decrease in Gini impurity per feature (sums to 1 unless
    /// no tree ever split).
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_threshold_data(n: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
        let features: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let signal = i as f64 / n as f64;
                let noise = ((i * 7919) % 97) as f64 / 97.0;
                vec![signal, noise]
            })
            .collect();
        let labels: Vec<u8> = (0..n).map(|i| u8::from(i * 2 >= n)).collect();
        (features, labels)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 15,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_forest_learns_threshold() {
        let (features, labels) = noisy_threshold_data(200);
        let forest = RandomForest::fit(small_config(), &features, &labels).unwrap();

        let predictions = forest.predict(&features);
        let correct = predictions.iter().zip(&labels).filter(|(p, l)| p == l).count();
        assert!(correct as f64 / labels.len() as f64 > 0.95);

        assert_eq!(forest.predict_one(&[0.05, 0.5]), 0);
        assert_eq!(forest.predict_one(&[0.95, 0.5]), 1);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (features, labels) = noisy_threshold_data(120);
        let a = RandomForest::fit(small_config(), &features, &labels).unwrap();
        let b = RandomForest::fit(small_config(), &features, &labels).unwrap();

        for x in &features {
            assert_eq!(a.predict_proba_one(x).to_bits(), b.predict_proba_one(x).to_bits());
        }
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_single_class_predicts_that_class() {
        let features: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, 1.0, 2.0, 3.0]).collect();
        let labels = vec![0u8; 30];

        let forest = RandomForest::fit(small_config(), &features, &labels).unwrap();
        assert!(forest.predict(&features).iter().all(|&p| p == 0));
        assert!(forest.feature_importances().iter().all(|&imp| imp == 0.0));
    }

    #[test]
    fn test_importances_favour_signal() {
        let (features, labels) = noisy_threshold_data(200);
        let forest = RandomForest::fit(small_config(), &features, &labels).unwrap();

        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 2);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1]);
    }

    #[test]
    fn test_empty_training_set() {
        let err = RandomForest::fit(ForestConfig::default(), &[], &[]).unwrap_err();
        assert_eq!(err, ModelError::EmptyTrainingSet);
    }

    #[test]
    fn test_forest_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomForest>();
    }
}
