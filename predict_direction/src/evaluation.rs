use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use nextday::core::io::create_file;

use crate::config::Config;
use crate::dataset::FEATURE_NAMES;
use crate::pipeline::{PipelineOutcome, PipelineReport};

/// Precision, recall and F1 of one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true samples of this class
    pub support: usize,
}

/// Averaged precision/recall/F1 across both classes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class breakdown of a binary prediction against ground truth.
///
/// Any 0/0 ratio resolves to 0.0, so a class absent from both truth and
/// predictions reports zero support and all-zero metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// Class 0
    pub down: ClassMetrics,
    /// Class 1
    pub up: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// `confusion[truth][predicted]`, class 0 first
    pub confusion: [[usize; 2]; 2],
    pub n_samples: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    /// Build the report from parallel truth/prediction label slices (0 or 1).
    /// Pairs beyond the shorter slice are ignored.
    pub fn from_labels(truth: &[u8], predicted: &[u8]) -> Self {
        let mut confusion = [[0usize; 2]; 2];
        for (&t, &p) in truth.iter().zip(predicted) {
            confusion[usize::from(t.min(1))][usize::from(p.min(1))] += 1;
        }
        let n_samples = confusion.iter().flatten().sum::<usize>();

        let class_metrics = |class: usize| {
            let other = 1 - class;
            let tp = confusion[class][class];
            let predicted_as = tp + confusion[other][class];
            let support = tp + confusion[class][other];
            let precision = ratio(tp, predicted_as);
            let recall = ratio(tp, support);
            ClassMetrics {
                precision,
                recall,
                f1: f1_score(precision, recall),
                support,
            }
        };
        let down = class_metrics(0);
        let up = class_metrics(1);

        let macro_avg = AverageMetrics {
            precision: (down.precision + up.precision) / 2.0,
            recall: (down.recall + up.recall) / 2.0,
            f1: (down.f1 + up.f1) / 2.0,
        };

        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if n_samples == 0 {
                0.0
            } else {
                (f(&down) * down.support as f64 + f(&up) * up.support as f64) / n_samples as f64
            }
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
        };

        ClassificationReport {
            down,
            up,
            accuracy: ratio(confusion[0][0] + confusion[1][1], n_samples),
            macro_avg,
            weighted_avg,
            confusion,
            n_samples,
        }
    }

    /// Render as a fixed-width table.
    pub fn to_table(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "  {:>12} {:>10} {:>10} {:>10} {:>10}\n",
            "", "precision", "recall", "f1-score", "support"
        ));
        for (name, m) in [("Down (0)", &self.down), ("Up (1)", &self.up)] {
            out.push_str(&format!(
                "  {:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}\n",
                name, m.precision, m.recall, m.f1, m.support
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "  {:>12} {:>10} {:>10} {:>10.4} {:>10}\n",
            "accuracy", "", "", self.accuracy, self.n_samples
        ));
        for (name, m) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            out.push_str(&format!(
                "  {:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}\n",
                name, m.precision, m.recall, m.f1, self.n_samples
            ));
        }
        out
    }
}

/// Number of trailing aligned rows listed in the text log.
const LOG_TAIL_ROWS: usize = 10;

/// Write results to file
pub fn write_results<P: AsRef<Path>>(path: P, config: &Config, report: &PipelineReport) -> Result<()> {
    let path = path.as_ref();
    let mut file = create_file(path).with_context(|| format!("creating {}", path.display()))?;

    writeln!(file, "PREDICT - Next-Day Direction Prediction")?;
    writeln!(file, "{}", "=".repeat(60))?;
    writeln!(file)?;

    writeln!(file, "Configuration:")?;
    writeln!(file, "  Symbol: {}", report.symbol)?;
    writeln!(file, "  Date range: {} to {} (end exclusive)", report.range.start, report.range.end)?;
    writeln!(file, "  Split strategy: {:?}", config.split)?;
    writeln!(file, "  Test fraction: {:.2}", config.test_fraction)?;
    writeln!(file, "  Seed: {}", config.seed)?;
    writeln!(file, "  Trees: {}", config.n_trees)?;
    writeln!(file, "  Max depth: {}", config.max_depth)?;
    writeln!(file, "  Min samples split: {}", config.min_samples_split)?;
    writeln!(file, "  Min samples leaf: {}", config.min_samples_leaf)?;
    writeln!(file)?;

    writeln!(file, "Data:")?;
    writeln!(file, "  Price bars: {}", report.n_bars)?;
    writeln!(file, "  Dataset rows: {}", report.dataset_rows)?;
    writeln!(file)?;

    match &report.outcome {
        PipelineOutcome::InsufficientData { reason } => {
            writeln!(file, "No data: {}", reason)?;
            writeln!(file)?;
        }
        PipelineOutcome::Trained { training, aligned } => {
            let model = &training.model;
            writeln!(file, "Fitted Forest:")?;
            writeln!(file, "  Trees: {}", model.n_trees())?;
            writeln!(file, "  Features: {}", model.n_features())?;
            writeln!(file, "  Bootstrap: {}", model.config().bootstrap)?;
            writeln!(file)?;

            writeln!(file, "Held-out Evaluation:")?;
            writeln!(file, "  Training rows: {}", training.n_train)?;
            writeln!(file, "  Held-out rows: {}", training.n_test)?;
            writeln!(file, "  Held-out accuracy: {:.4}", training.held_out_accuracy)?;
            if training.degenerate_labels {
                writeln!(file, "  WARNING: dataset contains a single target class")?;
            }
            writeln!(file)?;
            write!(file, "{}", training.report.to_table())?;
            writeln!(file)?;

            let c = &training.report.confusion;
            writeln!(file, "Confusion Matrix (rows: actual, columns: predicted):")?;
            writeln!(file, "  {:>10} {:>8} {:>8}", "", "Down", "Up")?;
            writeln!(file, "  {:>10} {:>8} {:>8}", "Down", c[0][0], c[0][1])?;
            writeln!(file, "  {:>10} {:>8} {:>8}", "Up", c[1][0], c[1][1])?;
            writeln!(file)?;

            writeln!(file, "Feature Importances:")?;
            for (name, imp) in FEATURE_NAMES.iter().zip(&training.feature_importances) {
                writeln!(file, "  {:>12} {:>10.4}", name, imp)?;
            }
            writeln!(file)?;

            writeln!(file, "Aligned Predictions (previous day's prediction vs today's target):")?;
            match aligned.display_accuracy {
                Some(acc) => writeln!(file, "  Display accuracy: {:.4} over {} rows", acc, aligned.rows.len())?,
                None => writeln!(file, "  Display accuracy: n/a (no aligned rows)")?,
            }
            writeln!(file)?;
            writeln!(
                file,
                "  {:>10} {:>12} {:>8} {:>10}",
                "Date", "Close", "Target", "Predicted"
            )?;
            writeln!(file, "  {}", "-".repeat(43))?;
            let skip = aligned.rows.len().saturating_sub(LOG_TAIL_ROWS);
            for row in &aligned.rows[skip..] {
                writeln!(
                    file,
                    "  {:>10} {:>12.4} {:>8} {:>10}",
                    row.date, row.close, row.target, row.prediction
                )?;
            }
            writeln!(file)?;
        }
    }

    writeln!(file, "Latest Indicator States:")?;
    match &report.summary {
        Some(s) => {
            writeln!(file, "  As of: {} (close {:.4})", s.date, s.close)?;
            writeln!(file, "  RSI: {:.2} ({})", s.rsi, s.rsi_state)?;
            writeln!(file, "  MACD: {:.4} ({}), signal {:.4}", s.macd, s.macd_state, s.macd_signal)?;
        }
        None => writeln!(file, "  n/a (not enough history)")?,
    }

    println!("\nResults written to {}", path.display());
    Ok(())
}
