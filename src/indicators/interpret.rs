use std::fmt;

use serde::{Deserialize, Serialize};

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;

/// Categorical reading of an RSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiState {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiState {
    /// Strict comparisons on both sides: exactly 70 or 30 is Neutral.
    pub fn classify(rsi: f64) -> Self {
        if rsi > RSI_OVERBOUGHT {
            RsiState::Overbought
        } else if rsi < RSI_OVERSOLD {
            RsiState::Oversold
        } else {
            RsiState::Neutral
        }
    }
}

impl fmt::Display for RsiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RsiState::Overbought => "Overbought",
            RsiState::Oversold => "Oversold",
            RsiState::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Categorical reading of a MACD value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdState {
    Bullish,
    Bearish,
}

impl MacdState {
    /// Bullish only when strictly above zero; a MACD of exactly 0 is Bearish.
    pub fn classify(macd: f64) -> Self {
        if macd > 0.0 {
            MacdState::Bullish
        } else {
            MacdState::Bearish
        }
    }
}

impl fmt::Display for MacdState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MacdState::Bullish => "Bullish",
            MacdState::Bearish => "Bearish",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_state_boundaries() {
        assert_eq!(RsiState::classify(70.0001), RsiState::Overbought);
        assert_eq!(RsiState::classify(70.0), RsiState::Neutral);
        assert_eq!(RsiState::classify(50.0), RsiState::Neutral);
        assert_eq!(RsiState::classify(30.0), RsiState::Neutral);
        assert_eq!(RsiState::classify(29.9999), RsiState::Oversold);
        assert_eq!(RsiState::classify(100.0), RsiState::Overbought);
        assert_eq!(RsiState::classify(0.0), RsiState::Oversold);
    }

    #[test]
    fn test_macd_zero_is_bearish() {
        assert_eq!(MacdState::classify(0.0), MacdState::Bearish);
        assert_eq!(MacdState::classify(-0.0), MacdState::Bearish);
        assert_eq!(MacdState::classify(1e-12), MacdState::Bullish);
        assert_eq!(MacdState::classify(-1e-12), MacdState::Bearish);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(RsiState::Overbought.to_string(), "Overbought");
        assert_eq!(RsiState::Oversold.to_string(), "Oversold");
        assert_eq!(RsiState::Neutral.to_string(), "Neutral");
        assert_eq!(MacdState::Bullish.to_string(), "Bullish");
        assert_eq!(MacdState::Bearish.to_string(), "Bearish");
    }
}
