use chrono::NaiveDate;
use indicators::{IndicatorSeries, MacdState, RsiState};
use nextday::core::io::PriceSeries;
use serde::Serialize;

/// Latest RSI/MACD readings with their categorical interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: f64,
    pub rsi_state: RsiState,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_state: MacdState,
}

impl IndicatorSummary {
    /// Readings of the last bar whose RSI is defined. The final bar counts
    /// even though it has no next-day target.
    pub fn latest(series: &PriceSeries, indicators: &IndicatorSeries) -> Option<Self> {
        if indicators.is_empty() {
            return None;
        }
        let bars = series.bars();
        let i = (0..bars.len().min(indicators.rsi.len()))
            .rev()
            .find(|&i| !indicators.rsi[i].is_nan())?;

        let rsi = indicators.rsi[i];
        let macd = indicators.macd[i];
        Some(IndicatorSummary {
            date: bars[i].date,
            close: bars[i].close,
            rsi,
            rsi_state: RsiState::classify(rsi),
            macd,
            macd_signal: indicators.macd_signal[i],
            macd_state: MacdState::classify(macd),
        })
    }
}
