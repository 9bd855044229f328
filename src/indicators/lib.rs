pub mod interpret;
pub mod oscillator;
pub mod trend;

use serde::{Deserialize, Serialize};

use oscillator::rsi::relative_strength_index;
use trend::ma::moving_average;
use trend::macd::{MacdConfig, macd};

pub use interpret::{MacdState, RsiState};

/// Lookback periods of the fixed feature set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub sma_period: usize,
    pub rsi_period: usize,
    pub macd: MacdConfig,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            sma_period: 20,
            rsi_period: 14,
            macd: MacdConfig::default(),
        }
    }
}

impl IndicatorParams {
    /// Number of leading positions with at least one undefined indicator.
    ///
    /// MACD is defined from the first bar, so only SMA and RSI contribute.
    pub fn warm_up(&self) -> usize {
        self.sma_period.saturating_sub(1).max(self.rsi_period)
    }
}

/// Indicator values aligned one-to-one with the input closes.
///
/// Positions inside a lookback window are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub sma: Vec<f64>,
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.sma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma.is_empty()
    }

    /// True when every indicator is defined at `index`.
    pub fn is_defined_at(&self, index: usize) -> bool {
        [
            self.sma[index],
            self.rsi[index],
            self.macd[index],
            self.macd_signal[index],
        ]
        .iter()
        .all(|v| !v.is_nan())
    }
}

/// Compute SMA, RSI, MACD and the MACD signal line over a close-price sequence.
///
/// Each value at position `i` depends only on `closes[..=i]`.
pub fn compute_indicator_series(closes: &[f64], params: &IndicatorParams) -> IndicatorSeries {
    let sma = moving_average(closes, params.sma_period);
    let rsi = relative_strength_index(closes, params.rsi_period);
    let output = macd(closes, params.macd);

    IndicatorSeries {
        sma,
        rsi,
        macd: output.macd_line,
        macd_signal: output.signal_line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn closes_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(1.0f64..1000.0, min..max)
    }

    #[test]
    fn test_default_warm_up() {
        assert_eq!(IndicatorParams::default().warm_up(), 19);
    }

    #[test]
    fn test_series_lengths_match_input() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let series = compute_indicator_series(&closes, &IndicatorParams::default());

        assert_eq!(series.len(), 40);
        assert_eq!(series.rsi.len(), 40);
        assert_eq!(series.macd.len(), 40);
        assert_eq!(series.macd_signal.len(), 40);
        assert!(!series.is_defined_at(18));
        assert!(series.is_defined_at(19));
    }

    #[test]
    fn test_recompute_is_bit_identical() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0 + i as f64 * 0.1)
            .collect();
        let params = IndicatorParams::default();

        let first = compute_indicator_series(&closes, &params);
        let second = compute_indicator_series(&closes, &params);

        for (a, b) in [
            (&first.sma, &second.sma),
            (&first.rsi, &second.rsi),
            (&first.macd, &second.macd),
            (&first.macd_signal, &second.macd_signal),
        ] {
            let a_bits: Vec<u64> = a.iter().map(|v| v.to_bits()).collect();
            let b_bits: Vec<u64> = b.iter().map(|v| v.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
    }

    #[test]
    fn test_indicators_do_not_read_future_bars() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 50.0 + (i as f64 * 0.9).cos() * 3.0)
            .collect();
        let params = IndicatorParams::default();
        let full = compute_indicator_series(&closes, &params);

        let cut = 45;
        let prefix = compute_indicator_series(&closes[..cut], &params);
        for i in 0..cut {
            assert_eq!(full.sma[i].to_bits(), prefix.sma[i].to_bits());
            assert_eq!(full.rsi[i].to_bits(), prefix.rsi[i].to_bits());
            assert_eq!(full.macd[i].to_bits(), prefix.macd[i].to_bits());
            assert_eq!(full.macd_signal[i].to_bits(), prefix.macd_signal[i].to_bits());
        }
    }

    proptest! {
        #[test]
        fn sma_undefined_below_twenty(closes in closes_strategy(0, 20)) {
            let series = compute_indicator_series(&closes, &IndicatorParams::default());
            prop_assert!(series.sma.iter().all(|v| v.is_nan()));
        }

        #[test]
        fn sma_is_trailing_mean(closes in closes_strategy(20, 80)) {
            let series = compute_indicator_series(&closes, &IndicatorParams::default());
            for i in 19..closes.len() {
                let mean = closes[i - 19..=i].iter().sum::<f64>() / 20.0;
                prop_assert!((series.sma[i] - mean).abs() < 1e-9 * mean.abs().max(1.0));
            }
        }

        #[test]
        fn rsi_bounded_where_defined(closes in closes_strategy(0, 80)) {
            let series = compute_indicator_series(&closes, &IndicatorParams::default());
            for (i, &v) in series.rsi.iter().enumerate() {
                if i < 14 {
                    prop_assert!(v.is_nan());
                } else {
                    prop_assert!((0.0..=100.0).contains(&v));
                }
            }
        }
    }
}
