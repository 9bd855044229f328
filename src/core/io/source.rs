use std::path::{Path, PathBuf};

use tracing::debug;

use super::market::{DateRange, MarketDataError, PriceSeries, read_market_file};

/// Supplier of daily price history for one symbol over a half-open date range.
///
/// Implementations return bars ordered by date with every bar inside `range`.
/// An empty series is a valid answer; callers decide whether that is fatal.
pub trait PriceSource {
    fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, MarketDataError>;
}

/// Reads `<dir>/<SYMBOL>.txt` market history files.
#[derive(Debug, Clone)]
pub struct MarketFileSource {
    dir: PathBuf,
}

impl MarketFileSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        MarketFileSource {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", symbol))
    }
}

impl PriceSource for MarketFileSource {
    fn fetch(&self, symbol: &str, range: DateRange) -> Result<PriceSeries, MarketDataError> {
        let path = self.path_for(symbol);
        let series = read_market_file(&path, symbol)?;
        let total = series.len();
        let series = series.restrict(&range);
        debug!(
            symbol,
            path = %path.display(),
            total,
            in_range = series.len(),
            "loaded market history"
        );
        Ok(series)
    }
}
