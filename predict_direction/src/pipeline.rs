//! One end-to-end run: fetch, indicators, dataset, training, alignment.
//!
//! A run owns every intermediate it creates. Nothing is cached between calls,
//! so independent runs may execute on separate threads.

use indicators::{IndicatorParams, compute_indicator_series};
use nextday::core::io::{DateRange, MarketDataError, PriceSource};
use nextday::models::ModelError;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, info_span, warn};

use crate::alignment::{AlignedPredictions, align_predictions};
use crate::dataset::{DatasetError, build_dataset};
use crate::summary::IndicatorSummary;
use crate::training::{TrainingOptions, TrainingResult, train_and_evaluate};

/// What to predict: one symbol over a half-open date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRequest {
    pub symbol: String,
    pub range: DateRange,
}

/// Split strategy, held-out fraction, split seed and forest settings.
pub type PipelineOptions = TrainingOptions;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no price data returned for {symbol} between {start} and {end}")]
    NoPriceData {
        symbol: String,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("failed to fetch price data: {0}")]
    Source(#[from] MarketDataError),

    #[error("dataset construction failed: {0}")]
    Dataset(#[from] DatasetError),

    #[error("model training failed: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// Too few usable rows to train; reported, not fatal.
    InsufficientData { reason: String },
    Trained {
        training: TrainingResult,
        aligned: AlignedPredictions,
    },
}

/// Typed result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub symbol: String,
    pub range: DateRange,
    pub n_bars: usize,
    pub dataset_rows: usize,
    pub outcome: PipelineOutcome,
    /// Latest RSI/MACD reading, if any bar has a defined RSI
    pub summary: Option<IndicatorSummary>,
}

impl PipelineReport {
    pub fn training(&self) -> Option<&TrainingResult> {
        match &self.outcome {
            PipelineOutcome::Trained { training, .. } => Some(training),
            PipelineOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn aligned(&self) -> Option<&AlignedPredictions> {
        match &self.outcome {
            PipelineOutcome::Trained { aligned, .. } => Some(aligned),
            PipelineOutcome::InsufficientData { .. } => None,
        }
    }
}

/// Run the full prediction pipeline for one request.
///
/// Only a failed fetch or an empty price series is an error; short or
/// single-class histories come back as a report.
pub fn run_pipeline<S: PriceSource + ?Sized>(
    source: &S,
    request: &PipelineRequest,
    options: &PipelineOptions,
) -> Result<PipelineReport, PipelineError> {
    let span = info_span!("pipeline", symbol = %request.symbol);
    let _guard = span.enter();

    let series = source.fetch(&request.symbol, request.range)?;
    if series.is_empty() {
        return Err(PipelineError::NoPriceData {
            symbol: request.symbol.clone(),
            start: request.range.start,
            end: request.range.end,
        });
    }
    info!(bars = series.len(), "price history fetched");

    let params = IndicatorParams::default();
    let indicators = compute_indicator_series(&series.closes(), &params);
    let summary = IndicatorSummary::latest(&series, &indicators);

    let dataset = build_dataset(&series, &indicators)?;
    info!(
        rows = dataset.len(),
        dropped_warm_up = dataset.dropped_warm_up,
        dropped_no_target = dataset.dropped_no_target,
        "dataset ready"
    );

    let outcome = match train_and_evaluate(&dataset, options)? {
        Some(training) => {
            let aligned = align_predictions(&training.model, &dataset);
            info!(
                held_out_accuracy = training.held_out_accuracy,
                display_accuracy = ?aligned.display_accuracy,
                "pipeline finished"
            );
            PipelineOutcome::Trained { training, aligned }
        }
        None => {
            let reason = format!(
                "{} price bars give {} usable rows; at least 2 are needed \
                 ({} warm-up bars plus one bar without a next-day close are dropped)",
                series.len(),
                dataset.len(),
                params.warm_up()
            );
            warn!(%reason, "insufficient data");
            PipelineOutcome::InsufficientData { reason }
        }
    };

    Ok(PipelineReport {
        symbol: request.symbol.clone(),
        range: request.range,
        n_bars: series.len(),
        dataset_rows: dataset.len(),
        outcome,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use nextday::core::io::PriceSeries;
    use nextday::models::ForestConfig;

    struct InMemorySource {
        closes: Vec<f64>,
    }

    impl PriceSource for InMemorySource {
        fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, MarketDataError> {
            let dates: Vec<NaiveDate> = (0..self.closes.len())
                .map(|i| range.start + Duration::days(i as i64))
                .collect();
            Ok(PriceSeries::from_closes(symbol, &dates, &self.closes)?.restrict(&range))
        }
    }

    fn request() -> PipelineRequest {
        PipelineRequest {
            symbol: "MEM".to_string(),
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            )
            .unwrap(),
        }
    }

    fn options() -> PipelineOptions {
        PipelineOptions {
            forest: ForestConfig {
                n_trees: 20,
                ..ForestConfig::default()
            },
            ..PipelineOptions::default()
        }
    }

    #[test]
    fn test_empty_source_is_hard_failure() {
        let source = InMemorySource { closes: Vec::new() };
        let err = run_pipeline(&source, &request(), &options()).unwrap_err();
        assert!(matches!(err, PipelineError::NoPriceData { .. }));
    }

    #[test]
    fn test_short_series_reports_insufficient_data() {
        let source = InMemorySource {
            closes: (0..15).map(|i| 10.0 + i as f64).collect(),
        };
        let report = run_pipeline(&source, &request(), &options()).unwrap();

        assert_eq!(report.n_bars, 15);
        assert_eq!(report.dataset_rows, 0);
        assert!(matches!(report.outcome, PipelineOutcome::InsufficientData { .. }));
        assert!(report.training().is_none());
        // 15 bars leave one defined RSI reading
        assert!(report.summary.is_some());
    }

    #[test]
    fn test_trained_outcome_row_counts() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 4.0 + i as f64 * 0.05)
            .collect();
        let source = InMemorySource { closes };
        let report = run_pipeline(&source, &request(), &options()).unwrap();

        assert_eq!(report.dataset_rows, 80 - 19 - 1);
        let training = report.training().unwrap();
        assert_eq!(training.n_test, 12);
        assert_eq!(training.n_train, 48);
        assert_eq!(report.aligned().unwrap().rows.len(), 59);
    }

    #[test]
    fn test_report_serializes_without_model() {
        let source = InMemorySource {
            closes: (0..45).map(|i| 50.0 + ((i * 17) % 11) as f64).collect(),
        };
        let report = run_pipeline(&source, &request(), &options()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["outcome"]["status"], "trained");
        assert!(json["outcome"]["training"].get("model").is_none());
        assert!(json["outcome"]["training"]["held_out_accuracy"].is_number());
        assert_eq!(json["range"]["start"], "2024-01-01");
    }
}
