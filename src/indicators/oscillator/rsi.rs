/// Compute RSI (Relative Strength Index) indicator
///
/// RSI is a momentum oscillator that measures the speed and magnitude of price changes.
/// Formula used here:
/// - Calculate day-over-day price changes
/// - Split into gains (positive changes) and losses (magnitude of negative changes)
/// - Take the trailing simple mean of each over `period` changes
/// - RS = Average Gain / Average Loss
/// - RSI = 100 - (100 / (1 + RS))
///
/// When the average loss of a window is exactly zero the ratio is unbounded and
/// RSI is reported as 100. This also covers a window with no movement at all.
///
/// # Arguments
/// * `prices` - Price data (raw closes)
/// * `period` - RSI lookback period (typically 14)
///
/// # Returns
/// Vector of RSI values in [0, 100], same length as `prices`. The first
/// `period` values are NaN (one change is lost to differencing).
pub fn relative_strength_index(prices: &[f64], period: usize) -> Vec<f64> {
    let mut rsi_values = vec![f64::NAN; prices.len()];

    if period == 0 || prices.len() <= period {
        return rsi_values;
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

    // changes[j] is the move into bar j + 1, so the window ending at bar i
    // covers changes[i - period..i]
    for (i, rsi_val) in rsi_values.iter_mut().enumerate().skip(period) {
        let window = &changes[i - period..i];

        let gain_sum: f64 = window.iter().filter(|&&c| c > 0.0).sum();
        let loss_sum: f64 = window.iter().filter(|&&c| c < 0.0).map(|c| -c).sum();

        let avg_gain = gain_sum / period as f64;
        let avg_loss = loss_sum / period as f64;

        *rsi_val = rsi_from_averages(avg_gain, avg_loss);
    }

    rsi_values
}

/// Resolve RSI from average gain and loss, pinning the zero-loss case to 100.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}
