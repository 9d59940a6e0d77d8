// =============================================================================
// Pipeline Configuration: file-backed settings with env overrides
// =============================================================================
//
// Every tunable of the batch and the data service lives here: input/output
// locations, the ticker allow-list, indicator windows, metric parameters and
// the keyword report size.
//
// Persistence uses an atomic tmp + rename pattern. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::IndicatorParams;
use crate::metrics::MetricParams;

pub const DEFAULT_CONFIG_FILE: &str = "pipeline_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_news_file() -> PathBuf {
    PathBuf::from("data/raw/raw_analyst_ratings.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_price_suffix() -> String {
    "_historical_data.csv".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8050".to_string()
}

fn default_sma_periods() -> Vec<usize> {
    vec![10, 20, 50]
}

fn default_14() -> usize {
    14
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_nbdev() -> f64 {
    2.0
}

fn default_3() -> usize {
    3
}

fn default_volatility_window() -> usize {
    20
}

fn default_trading_days() -> f64 {
    252.0
}

fn default_keyword_top_n() -> usize {
    50
}

// =============================================================================
// PipelineConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    // --- Locations -----------------------------------------------------------

    /// Directory scanned for `<TICKER><price_suffix>` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Headline CSV.
    #[serde(default = "default_news_file")]
    pub news_file: PathBuf,

    /// Where every derived table is written and served from.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_price_suffix")]
    pub price_suffix: String,

    /// Tickers to process. Empty means every file found.
    #[serde(default)]
    pub tickers: Vec<String>,

    /// Data service listen address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Indicator windows ---------------------------------------------------

    #[serde(default = "default_sma_periods")]
    pub sma_periods: Vec<usize>,

    #[serde(default = "default_14")]
    pub rsi_period: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,

    /// Band width in standard deviations, applied on both sides.
    #[serde(default = "default_bollinger_nbdev")]
    pub bollinger_nbdev: f64,

    #[serde(default = "default_14")]
    pub stoch_fastk: usize,

    #[serde(default = "default_3")]
    pub stoch_slowk: usize,

    #[serde(default = "default_3")]
    pub stoch_slowd: usize,

    #[serde(default = "default_14")]
    pub adx_period: usize,

    #[serde(default = "default_14")]
    pub atr_period: usize,

    // --- Metrics -------------------------------------------------------------

    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,

    #[serde(default = "default_trading_days")]
    pub trading_days: f64,

    // --- Keywords ------------------------------------------------------------

    #[serde(default = "default_keyword_top_n")]
    pub keyword_top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            news_file: default_news_file(),
            output_dir: default_output_dir(),
            price_suffix: default_price_suffix(),
            tickers: Vec::new(),
            bind_addr: default_bind_addr(),
            sma_periods: default_sma_periods(),
            rsi_period: default_14(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            bollinger_period: default_bollinger_period(),
            bollinger_nbdev: default_bollinger_nbdev(),
            stoch_fastk: default_14(),
            stoch_slowk: default_3(),
            stoch_slowd: default_3(),
            adx_period: default_14(),
            atr_period: default_14(),
            volatility_window: default_volatility_window(),
            trading_days: default_trading_days(),
            keyword_top_n: default_keyword_top_n(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse pipeline config from {}", path.display()))?;

        info!(
            path = %path.display(),
            tickers = ?config.tickers,
            "pipeline config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write (write to
    /// `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise pipeline config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "pipeline config saved (atomic)");
        Ok(())
    }

    /// Apply `SENTIMENT_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SENTIMENT_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SENTIMENT_NEWS_FILE") {
            self.news_file = PathBuf::from(v);
        }
        if let Some(v) = get("SENTIMENT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SENTIMENT_TICKERS") {
            self.tickers = v
                .split(',')
                .map(|t| t.trim().to_ascii_uppercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(v) = get("SENTIMENT_BIND_ADDR") {
            self.bind_addr = v;
        }
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            sma_periods: self.sma_periods.clone(),
            rsi_period: self.rsi_period,
            macd_fast: self.macd_fast,
            macd_slow: self.macd_slow,
            macd_signal: self.macd_signal,
            bollinger_period: self.bollinger_period,
            bollinger_nbdev: self.bollinger_nbdev,
            stoch_fastk: self.stoch_fastk,
            stoch_slowk: self.stoch_slowk,
            stoch_slowd: self.stoch_slowd,
            adx_period: self.adx_period,
            atr_period: self.atr_period,
        }
    }

    pub fn metric_params(&self) -> MetricParams {
        MetricParams {
            volatility_window: self.volatility_window,
            trading_days: self.trading_days,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_engine_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.indicator_params(), IndicatorParams::default());
        assert_eq!(cfg.metric_params(), MetricParams::default());
        assert_eq!(cfg.price_suffix, "_historical_data.csv");
        assert!(cfg.tickers.is_empty());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "sma_periods": [5], "tickers": ["AAPL"], "trading_days": 365 }"#;
        let cfg: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.sma_periods, vec![5]);
        assert_eq!(cfg.tickers, vec!["AAPL"]);
        assert_eq!(cfg.trading_days, 365.0);
        assert_eq!(cfg.rsi_period, 14);
        assert_eq!(cfg.stoch_slowd, 3);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut cfg = PipelineConfig::default();
        cfg.keyword_top_n = 7;
        cfg.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(PipelineConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PipelineConfig::load(dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SENTIMENT_TICKERS", "aapl, msft,,"),
            ("SENTIMENT_OUTPUT_DIR", "/tmp/out"),
            ("SENTIMENT_BIND_ADDR", "  "),
        ]);
        let mut cfg = PipelineConfig::default();
        cfg.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.bind_addr, default_bind_addr());
    }
}
