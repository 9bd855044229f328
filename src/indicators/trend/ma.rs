/// Calculates the Simple Moving Average (SMA) for a given data slice and number of lags.
///
/// # Arguments
///
/// * `data` - A slice of f64 values.
/// * `lags` - The window size for the moving average.
///
/// # Returns
///
/// A Vec<f64> containing the SMA values. The first `lags - 1` values are NaN.
pub fn moving_average(data: &[f64], lags: usize) -> Vec<f64> {
    if lags == 0 || lags > data.len() {
        return vec![f64::NAN; data.len()];
    }

    let mut sma = Vec::with_capacity(data.len());

    // Pad with NaN for the initial period where we don't have enough data
    for _ in 0..lags - 1 {
        sma.push(f64::NAN);
    }

    let mut sum: f64 = data.iter().take(lags).sum();
    sma.push(sum / lags as f64);

    for i in lags..data.len() {
        sum = sum - data[i - lags] + data[i];
        sma.push(sum / lags as f64);
    }

    sma
}

/// Calculates the Exponential Moving Average (EMA) with smoothing factor `2 / (period + 1)`.
///
/// The recurrence is seeded with the first observation rather than a simple
/// average, so the output is defined from position 0 onward and has the same
/// length as `data`.
///
/// A `period` of 0 is treated as 1 (no smoothing).
pub fn exponential_moving_average(data: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period.max(1) as f64 + 1.0);

    let mut ema = Vec::with_capacity(data.len());
    let mut prev = match data.first() {
        Some(&first) => first,
        None => return ema,
    };
    ema.push(prev);

    for &x in &data[1..] {
        prev += alpha * (x - prev);
        ema.push(prev);
    }

    ema
}
