use chrono::NaiveDate;
use nextday::models::RandomForest;
use serde::Serialize;
use tracing::debug;

use crate::dataset::{Dataset, Direction};

/// A day's realized target next to the prediction computed one day earlier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionRow {
    pub date: NaiveDate,
    pub close: f64,
    pub target: Direction,
    /// Model output from the previous row's indicators
    pub prediction: Direction,
}

impl PredictionRow {
    pub fn correct(&self) -> bool {
        self.prediction == self.target
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPredictions {
    pub rows: Vec<PredictionRow>,
    /// Fraction of aligned rows whose prediction matches the target.
    /// `None` when no row survives the shift.
    pub display_accuracy: Option<f64>,
}

/// Score every dataset row in-sample, then shift the scores forward one row.
///
/// Row `i` of the result carries the prediction made from dataset row `i - 1`;
/// the first dataset row has no earlier prediction and is dropped, so the
/// result has `dataset.len() - 1` rows (or none).
pub fn align_predictions(model: &RandomForest, dataset: &Dataset) -> AlignedPredictions {
    let scores: Vec<Direction> = dataset
        .rows
        .iter()
        .map(|row| Direction::from_label(model.predict_one(&row.indicators.features())))
        .collect();

    let rows: Vec<PredictionRow> = dataset
        .rows
        .iter()
        .skip(1)
        .zip(&scores)
        .map(|(row, &prediction)| PredictionRow {
            date: row.date,
            close: row.close,
            target: row.target,
            prediction,
        })
        .collect();

    let display_accuracy = if rows.is_empty() {
        None
    } else {
        Some(rows.iter().filter(|r| r.correct()).count() as f64 / rows.len() as f64)
    };

    debug!(rows = rows.len(), ?display_accuracy, "predictions aligned");

    AlignedPredictions {
        rows,
        display_accuracy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{IndicatorRow, LabeledRow};
    use chrono::Duration;
    use nextday::models::ForestConfig;
    use proptest::prelude::*;

    /// Rows whose RSI encodes the target: rsi 80 for Up, 20 for Down.
    fn dataset_from_targets(targets: &[Direction]) -> Dataset {
        let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let rows = targets
            .iter()
            .enumerate()
            .map(|(i, &target)| LabeledRow {
                date: start + Duration::days(i as i64),
                close: 10.0 + i as f64,
                indicators: IndicatorRow {
                    sma: 10.0,
                    rsi: if target == Direction::Up { 80.0 } else { 20.0 },
                    macd: 0.0,
                    macd_signal: 0.0,
                },
                target,
            })
            .collect();
        Dataset {
            symbol: "ALN".to_string(),
            rows,
            dropped_warm_up: 0,
            dropped_no_target: 0,
        }
    }

    fn fit_on(dataset: &Dataset) -> RandomForest {
        let config = ForestConfig {
            n_trees: 5,
            max_features: Some(4),
            bootstrap: false,
            ..ForestConfig::default()
        };
        RandomForest::fit(config, &dataset.features(), &dataset.labels()).unwrap()
    }

    #[test]
    fn test_shift_uses_previous_rows_prediction() {
        use Direction::{Down, Up};
        let targets = [Up, Down, Down, Up, Up, Down, Up, Down];
        let dataset = dataset_from_targets(&targets);
        let model = fit_on(&dataset);

        let aligned = align_predictions(&model, &dataset);
        assert_eq!(aligned.rows.len(), targets.len() - 1);

        for (i, row) in aligned.rows.iter().enumerate() {
            assert_eq!(row.date, dataset.rows[i + 1].date);
            assert_eq!(row.target, targets[i + 1]);
            // the model reproduces its training labels, so the shifted
            // prediction is the previous day's target
            assert_eq!(row.prediction, targets[i]);
        }

        let expected = aligned
            .rows
            .iter()
            .filter(|r| r.prediction == r.target)
            .count() as f64
            / 7.0;
        assert_eq!(aligned.display_accuracy, Some(expected));
    }

    #[test]
    fn test_alternating_targets_score_zero_after_shift() {
        use Direction::{Down, Up};
        let targets = [Up, Down, Up, Down, Up, Down];
        let dataset = dataset_from_targets(&targets);
        let model = fit_on(&dataset);

        let aligned = align_predictions(&model, &dataset);
        assert_eq!(aligned.display_accuracy, Some(0.0));
    }

    #[test]
    fn test_too_few_rows() {
        let dataset = dataset_from_targets(&[Direction::Up, Direction::Down]);
        let model = fit_on(&dataset);

        let one = Dataset {
            rows: dataset.rows[..1].to_vec(),
            ..dataset.clone()
        };
        let aligned = align_predictions(&model, &one);
        assert!(aligned.rows.is_empty());
        assert_eq!(aligned.display_accuracy, None);

        let empty = Dataset {
            rows: Vec::new(),
            ..dataset
        };
        assert_eq!(align_predictions(&model, &empty).display_accuracy, None);
    }

    #[test]
    fn test_dataset_not_modified() {
        let dataset = dataset_from_targets(&[Direction::Up, Direction::Down, Direction::Up]);
        let before = dataset.clone();
        let model = fit_on(&dataset);
        let _ = align_predictions(&model, &dataset);
        assert_eq!(dataset, before);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn aligned_row_count(ups in proptest::collection::vec(any::<bool>(), 1..40)) {
            let targets: Vec<Direction> = ups
                .iter()
                .map(|&up| if up { Direction::Up } else { Direction::Down })
                .collect();
            let dataset = dataset_from_targets(&targets);
            let model = fit_on(&dataset);
            let aligned = align_predictions(&model, &dataset);

            prop_assert_eq!(aligned.rows.len(), dataset.len() - 1);
            if let Some(acc) = aligned.display_accuracy {
                prop_assert!((0.0..=1.0).contains(&acc));
            }
        }
    }
}
