mod decision_tree;
mod random_forest;

use thiserror::Error;

pub use decision_tree::{DecisionTree, TreeConfig, TreeNode};
pub use random_forest::{ForestConfig, RandomForest};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("cannot fit a model on an empty training set")]
    EmptyTrainingSet,

    #[error("feature rows ({rows}) and labels ({labels}) differ in length")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("row {row} has {found} features, expected {expected}")]
    RaggedFeatures {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("row {row} contains a non-finite feature value")]
    NonFiniteFeature { row: usize },

    #[error("label {label} at row {row} is not 0 or 1")]
    InvalidLabel { row: usize, label: u8 },
}

/// Check a binary classification training set and return its feature count.
pub(crate) fn validate_training_set(features: &[Vec<f64>], labels: &[u8]) -> Result<usize, ModelError> {
    if features.len() != labels.len() {
        return Err(ModelError::LengthMismatch {
            rows: features.len(),
            labels: labels.len(),
        });
    }
    let first = features.first().ok_or(ModelError::EmptyTrainingSet)?;
    let n_features = first.len();

    for (row, x) in features.iter().enumerate() {
        if x.len() != n_features {
            return Err(ModelError::RaggedFeatures {
                row,
                found: x.len(),
                expected: n_features,
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteFeature { row });
        }
    }
    if let Some((row, &label)) = labels.iter().enumerate().find(|&(_, &l)| l > 1) {
        return Err(ModelError::InvalidLabel { row, label });
    }
    Ok(n_features)
}
