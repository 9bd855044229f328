use serde::{Deserialize, Serialize};

use crate::trend::ma::exponential_moving_average;

/// MACD (Moving Average Convergence Divergence) configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdConfig {
    /// Fast EMA period (typically 12)
    pub fast_period: usize,
    /// Slow EMA period (typically 26)
    pub slow_period: usize,
    /// Signal line EMA period (typically 9)
    pub signal_period: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        MacdConfig {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD (Moving Average Convergence Divergence) Output
#[derive(Debug, Clone)]
pub struct MacdOutput {
    /// MACD Line = Fast EMA - Slow EMA
    pub macd_line: Vec<f64>,
    /// Signal Line = EMA of MACD Line
    pub signal_line: Vec<f64>,
    /// Histogram = MACD Line - Signal Line
    pub histogram: Vec<f64>,
}

/// Computes the MACD indicator.
///
/// Every EMA involved is seeded with its first input value, so all three
/// output lines are defined from the first bar and have the same length as
/// `data`.
///
/// # Arguments
///
/// * `data` - A slice of f64 values (typically closing prices).
/// * `config` - Fast, slow and signal periods.
///
/// # Returns
///
/// A `MacdOutput` struct containing the MACD line, signal line, and histogram.
pub fn macd(data: &[f64], config: MacdConfig) -> MacdOutput {
    let fast_ema = exponential_moving_average(data, config.fast_period);
    let slow_ema = exponential_moving_average(data, config.slow_period);

    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(&fast, &slow)| fast - slow)
        .collect();

    let signal_line = exponential_moving_average(&macd_line, config.signal_period);

    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(&m, &s)| m - s)
        .collect();

    MacdOutput {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Calculate MACD with default parameters (12, 26, 9)
pub fn macd_default(data: &[f64]) -> MacdOutput {
    macd(data, MacdConfig::default())
}
