use clap::ValueEnum;
use nextday::models::{ForestConfig, ModelError, RandomForest};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::evaluation::ClassificationReport;

/// How dataset rows are assigned to the training and held-out partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Seeded row-wise shuffle. Rows after a held-out day can land in training.
    #[default]
    Random,
    /// Oldest rows train, most recent rows are held out.
    Chronological,
}

/// Row indices of each partition, into the dataset's chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split `n_rows` rows into training and held-out index sets.
///
/// `ceil(test_fraction * n_rows)` rows are held out, leaving at least one row
/// on each side. Returns `None` when fewer than two rows are available.
pub fn split_indices(
    n_rows: usize,
    test_fraction: f64,
    strategy: SplitStrategy,
    seed: u64,
) -> Option<DataSplit> {
    if n_rows < 2 {
        return None;
    }
    let n_test = ((test_fraction * n_rows as f64).ceil() as usize).clamp(1, n_rows - 1);

    let split = match strategy {
        SplitStrategy::Random => {
            let mut indices: Vec<usize> = (0..n_rows).collect();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
            let train = indices.split_off(n_test);
            DataSplit {
                train,
                test: indices,
            }
        }
        SplitStrategy::Chronological => DataSplit {
            train: (0..n_rows - n_test).collect(),
            test: (n_rows - n_test..n_rows).collect(),
        },
    };
    Some(split)
}

/// Settings of the training protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub split: SplitStrategy,
    pub test_fraction: f64,
    /// Seed for the train/test shuffle
    pub seed: u64,
    pub forest: ForestConfig,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            split: SplitStrategy::Random,
            test_fraction: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

/// Result of model training
#[derive(Debug, Clone, Serialize)]
pub struct TrainingResult {
    #[serde(skip)]
    pub model: RandomForest,
    /// Accuracy on the held-out partition, scored on each row's own features
    pub held_out_accuracy: f64,
    pub report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
    pub split: SplitStrategy,
    /// Only one target class was present in the dataset
    pub degenerate_labels: bool,
    pub feature_importances: Vec<f64>,
}

/// Split the dataset, fit a forest on the four indicator features and score
/// the held-out rows.
///
/// Returns `Ok(None)` when the dataset has too few rows to split.
pub fn train_and_evaluate(
    dataset: &Dataset,
    options: &TrainingOptions,
) -> Result<Option<TrainingResult>, ModelError> {
    let Some(split) = split_indices(dataset.len(), options.test_fraction, options.split, options.seed)
    else {
        warn!(rows = dataset.len(), "not enough rows to split into train and test");
        return Ok(None);
    };

    let features = dataset.features();
    let labels = dataset.labels();

    let select_x = |idx: &[usize]| idx.iter().map(|&i| features[i].clone()).collect::<Vec<_>>();
    let select_y = |idx: &[usize]| idx.iter().map(|&i| labels[i]).collect::<Vec<_>>();

    let (x_train, y_train) = (select_x(&split.train), select_y(&split.train));
    let (x_test, y_test) = (select_x(&split.test), select_y(&split.test));

    let degenerate_labels = dataset.n_classes() < 2;
    if degenerate_labels {
        warn!(
            symbol = %dataset.symbol,
            rows = dataset.len(),
            "dataset contains a single target class; model is degenerate"
        );
    }

    info!(
        n_train = x_train.len(),
        n_test = x_test.len(),
        split = ?options.split,
        n_trees = options.forest.n_trees,
        "training random forest"
    );
    let model = RandomForest::fit(options.forest.clone(), &x_train, &y_train)?;

    let predicted = model.predict(&x_test);
    let report = ClassificationReport::from_labels(&y_test, &predicted);
    info!(held_out_accuracy = report.accuracy, "held-out evaluation done");

    Ok(Some(TrainingResult {
        feature_importances: model.feature_importances().to_vec(),
        held_out_accuracy: report.accuracy,
        report,
        n_train: x_train.len(),
        n_test: x_test.len(),
        split: options.split,
        degenerate_labels,
        model,
    }))
}
