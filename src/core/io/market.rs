use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or validating market history.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("cannot open market history file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("bar dated {date} is not after the previous bar ({previous})")]
    Unordered { previous: NaiveDate, date: NaiveDate },

    #[error("bar dated {date} has an invalid price: {message}")]
    InvalidBar { date: NaiveDate, message: String },

    #[error("{dates} dates given for {closes} closes")]
    LengthMismatch { dates: usize, closes: usize },

    #[error("invalid date range: start {start} is not before end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// One trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    fn validate(&self) -> Result<(), MarketDataError> {
        let invalid = |message: &str| MarketDataError::InvalidBar {
            date: self.date,
            message: message.to_string(),
        };

        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(invalid("non-positive or non-finite price"));
        }
        if self.low > self.open || self.low > self.close || self.high < self.open || self.high < self.close {
            return Err(invalid("open/high/low/close relationship violated"));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(invalid("negative or non-finite volume"));
        }
        Ok(())
    }
}

/// Ordered daily history of one instrument.
///
/// Dates are strictly increasing; gaps (non-trading days) are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, validating every bar and the date ordering.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, MarketDataError> {
        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(MarketDataError::Unordered {
                    previous: pair[0].date,
                    date: pair[1].date,
                });
            }
        }
        Ok(PriceSeries {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Build a series from closes only, one bar per date. Open/high/low are set to the close.
    pub fn from_closes(
        symbol: impl Into<String>,
        dates: &[NaiveDate],
        closes: &[f64],
    ) -> Result<Self, MarketDataError> {
        if dates.len() != closes.len() {
            return Err(MarketDataError::LengthMismatch {
                dates: dates.len(),
                closes: closes.len(),
            });
        }
        let bars = dates
            .iter()
            .zip(closes.iter())
            .map(|(&date, &close)| PriceBar {
                date,
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Keep only the bars inside `range`.
    pub fn restrict(self, range: &DateRange) -> Self {
        PriceSeries {
            symbol: self.symbol,
            bars: self
                .bars
                .into_iter()
                .filter(|b| range.contains(b.date))
                .collect(),
        }
    }
}

/// Half-open calendar range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, MarketDataError> {
        if start >= end {
            return Err(MarketDataError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Parse a date written either as `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_market_date(text: &str) -> Option<NaiveDate> {
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        let year = text[0..4].parse().ok()?;
        let month = text[4..6].parse().ok()?;
        let day = text[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Read a market history file with OHLC format (YYYYMMDD Open High Low Close [Volume]).
///
/// Fields may be separated by spaces, tabs or commas. Blank lines are skipped.
/// Prices are returned raw (not log-transformed).
pub fn read_market_file<P: AsRef<Path>>(
    filename: P,
    symbol: &str,
) -> Result<PriceSeries, MarketDataError> {
    let path = filename.as_ref();
    let file = File::open(path).map_err(|source| MarketDataError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = BufReader::new(file);
    let mut bars = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line_no = line_num + 1;
        let line = line_result.map_err(|source| MarketDataError::Read {
            line: line_no,
            source,
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let parse_err = |message: &str| MarketDataError::Parse {
            line: line_no,
            message: message.to_string(),
        };

        let parts: Vec<&str> = line
            .split([' ', '\t', ','])
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() < 5 {
            return Err(parse_err("expected date, open, high, low and close"));
        }

        let date = parse_market_date(parts[0]).ok_or_else(|| parse_err("invalid date"))?;

        let field = |idx: usize, name: &str| -> Result<f64, MarketDataError> {
            parts[idx]
                .parse::<f64>()
                .map_err(|_| parse_err(&format!("invalid {} price", name)))
        };

        let open = field(1, "open")?;
        let high = field(2, "high")?;
        let low = field(3, "low")?;
        let close = field(4, "close")?;
        let volume = match parts.get(5) {
            Some(v) => v.parse::<f64>().map_err(|_| parse_err("invalid volume"))?,
            None => 0.0,
        };

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    PriceSeries::new(symbol, bars)
}
