pub mod ma;
pub mod macd;
