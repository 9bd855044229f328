use std::fmt;

use chrono::NaiveDate;
use indicators::IndicatorSeries;
use nextday::core::io::PriceSeries;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Names of the model inputs, in column order.
pub const FEATURE_NAMES: [&str; 4] = ["SMA_20", "RSI_14", "MACD", "MACD_signal"];

/// Direction of the next close relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Next close strictly above the current close (label 1)
    Up,
    /// Next close equal to or below the current close (label 0)
    Down,
}

impl Direction {
    pub fn label(self) -> u8 {
        match self {
            Direction::Up => 1,
            Direction::Down => 0,
        }
    }

    pub fn from_label(label: u8) -> Self {
        if label == 1 { Direction::Up } else { Direction::Down }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("price series has {series} bars but indicator series has {indicators}")]
    LengthMismatch { series: usize, indicators: usize },
}

/// Indicator values of one trading day, all defined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub sma: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
}

impl IndicatorRow {
    pub fn features(&self) -> Vec<f64> {
        vec![self.sma, self.rsi, self.macd, self.macd_signal]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub date: NaiveDate,
    pub close: f64,
    pub indicators: IndicatorRow,
    pub target: Direction,
}

/// Chronologically ordered feature/label table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub symbol: String,
    pub rows: Vec<LabeledRow>,
    /// Rows dropped because some indicator was still warming up
    pub dropped_warm_up: usize,
    /// Rows dropped because no next close exists (0 or 1)
    pub dropped_no_target: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature matrix in `FEATURE_NAMES` order.
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.indicators.features()).collect()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.target.label()).collect()
    }

    /// Number of distinct target classes present (0, 1 or 2).
    pub fn n_classes(&self) -> usize {
        let has_up = self.rows.iter().any(|r| r.target == Direction::Up);
        let has_down = self.rows.iter().any(|r| r.target == Direction::Down);
        usize::from(has_up) + usize::from(has_down)
    }
}

/// Label each day with the direction of the following close.
///
/// Position `i` is `Up` iff `closes[i + 1] > closes[i]`; equal closes count as
/// `Down`. The last position has no following close and is `None`.
pub fn compute_targets(closes: &[f64]) -> Vec<Option<Direction>> {
    let mut targets: Vec<Option<Direction>> = closes
        .windows(2)
        .map(|w| {
            Some(if w[1] > w[0] {
                Direction::Up
            } else {
                Direction::Down
            })
        })
        .collect();
    if !closes.is_empty() {
        targets.push(None);
    }
    targets
}

/// Join prices, indicators and targets per day, dropping every row with an
/// undefined indicator or target. Order is preserved.
pub fn build_dataset(
    series: &PriceSeries,
    indicators: &IndicatorSeries,
) -> Result<Dataset, DatasetError> {
    if indicators.len() != series.len()
        || indicators.rsi.len() != series.len()
        || indicators.macd.len() != series.len()
        || indicators.macd_signal.len() != series.len()
    {
        return Err(DatasetError::LengthMismatch {
            series: series.len(),
            indicators: indicators.len(),
        });
    }

    let closes = series.closes();
    let targets = compute_targets(&closes);

    let mut rows = Vec::with_capacity(series.len());
    let mut dropped_warm_up = 0;
    let mut dropped_no_target = 0;

    for (i, (bar, target)) in series.bars().iter().zip(targets).enumerate() {
        if !indicators.is_defined_at(i) {
            dropped_warm_up += 1;
            continue;
        }
        let Some(target) = target else {
            dropped_no_target += 1;
            continue;
        };

        rows.push(LabeledRow {
            date: bar.date,
            close: bar.close,
            indicators: IndicatorRow {
                sma: indicators.sma[i],
                rsi: indicators.rsi[i],
                macd: indicators.macd[i],
                macd_signal: indicators.macd_signal[i],
            },
            target,
        });
    }

    debug!(
        symbol = series.symbol(),
        bars = series.len(),
        rows = rows.len(),
        dropped_warm_up,
        dropped_no_target,
        "dataset built"
    );
    if rows.is_empty() {
        warn!(
            symbol = series.symbol(),
            bars = series.len(),
            "no rows with fully defined indicators and target"
        );
    }

    Ok(Dataset {
        symbol: series.symbol().to_string(),
        rows,
        dropped_warm_up,
        dropped_no_target,
    })
}
