use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::Deserialize;

use nextday::core::io::DateRange;
use nextday::models::ForestConfig;

use crate::pipeline::{PipelineOptions, PipelineRequest};
use crate::training::SplitStrategy;

fn default_data_dir() -> String {
    "data/".to_string()
}

fn default_output_path() -> String {
    "results/".to_string()
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_n_trees() -> usize {
    100
}

fn default_max_depth() -> usize {
    10
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

/// Configuration for next-day direction prediction
#[derive(Debug, Clone, Deserialize, Parser)]
pub struct Config {
    /// Instrument symbol; prices are read from <DATA_DIR>/<SYMBOL>.txt
    #[arg(long)]
    pub symbol: String,

    /// Directory holding market history files (YYYYMMDD Open High Low Close [Volume])
    #[arg(long, default_value = "data/")]
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// First date of the range (inclusive), YYYY-MM-DD
    #[arg(long)]
    pub start: NaiveDate,

    /// End of the range (exclusive), YYYY-MM-DD
    #[arg(long)]
    pub end: NaiveDate,

    /// Directory for the results log and reports
    #[arg(long, default_value = "results/")]
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Train/test split strategy
    #[arg(long, value_enum, default_value_t = SplitStrategy::Random)]
    #[serde(default)]
    pub split: SplitStrategy,

    /// Fraction of dataset rows held out for evaluation (0-1)
    #[arg(long, default_value_t = 0.2)]
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Seed for the split shuffle and the forest
    #[arg(long, default_value_t = 42)]
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Maximum depth of each tree
    #[arg(long, default_value_t = 10)]
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Minimum samples required to split a node
    #[arg(long, default_value_t = 2)]
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,

    /// Minimum samples in a leaf
    #[arg(long, default_value_t = 1)]
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<String>,
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            anyhow::bail!("symbol must not be empty");
        }

        if self.start >= self.end {
            anyhow::bail!("start ({}) must be before end ({})", self.start, self.end);
        }

        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            anyhow::bail!("test_fraction must be in range (0, 1), got {}", self.test_fraction);
        }

        if self.n_trees == 0 {
            anyhow::bail!("n_trees must be greater than 0");
        }

        if self.max_depth == 0 {
            anyhow::bail!("max_depth must be greater than 0");
        }

        if self.min_samples_split < 2 {
            anyhow::bail!("min_samples_split must be at least 2");
        }

        if self.min_samples_leaf == 0 {
            anyhow::bail!("min_samples_leaf must be greater than 0");
        }

        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn date_range(&self) -> Result<DateRange> {
        Ok(DateRange::new(self.start, self.end)?)
    }

    pub fn request(&self) -> Result<PipelineRequest> {
        Ok(PipelineRequest {
            symbol: self.symbol.clone(),
            range: self.date_range()?,
        })
    }

    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            split: self.split,
            test_fraction: self.test_fraction,
            seed: self.seed,
            forest: ForestConfig {
                n_trees: self.n_trees,
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
                min_samples_leaf: self.min_samples_leaf,
                seed: self.seed,
                ..ForestConfig::default()
            },
        }
    }

    /// Path of a report file inside `output_path`.
    pub fn output_file(&self, name: &str) -> std::path::PathBuf {
        std::path::Path::new(&self.output_path).join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn base_config() -> Config {
        Config {
            symbol: "SPY".to_string(),
            data_dir: "data/".to_string(),
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            output_path: "results/".to_string(),
            split: SplitStrategy::Random,
            test_fraction: 0.2,
            seed: 42,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            log_file: None,
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = base_config();
        assert!(config.validate().is_ok());

        config.test_fraction = 1.0;
        assert!(config.validate().is_err());

        config.test_fraction = 0.0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.end = config.start;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.n_trees = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.min_samples_split = 1;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.min_samples_leaf = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.symbol = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_applies_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("predict.toml");
        fs::write(
            &path,
            r#"
symbol = "QQQ"
data_dir = "/tmp/market"
start = "2019-01-01"
end = "2020-06-30"
split = "chronological"
n_trees = 25
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.symbol, "QQQ");
        assert_eq!(config.start, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(config.split, SplitStrategy::Chronological);
        assert_eq!(config.n_trees, 25);
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.output_path, "results/");
        assert!(config.log_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_parsing() {
        let config = Config::try_parse_from([
            "predict_direction",
            "--symbol",
            "AAPL",
            "--start",
            "2022-01-03",
            "--end",
            "2023-01-03",
            "--split",
            "chronological",
            "--seed",
            "7",
        ])
        .unwrap();

        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.split, SplitStrategy::Chronological);
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.data_dir, "data/");
    }

    #[test]
    fn test_options_and_request() {
        let mut config = base_config();
        config.seed = 9;
        config.n_trees = 12;

        let options = config.options();
        assert_eq!(options.seed, 9);
        assert_eq!(options.forest.seed, 9);
        assert_eq!(options.forest.n_trees, 12);
        assert!(options.forest.bootstrap);

        let request = config.request().unwrap();
        assert_eq!(request.symbol, "SPY");
        assert!(request.range.contains(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap()));
        assert!(!request.range.contains(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()));
        assert_eq!(config.output_file("PREDICT.LOG"), std::path::Path::new("results/PREDICT.LOG"));
    }
}
