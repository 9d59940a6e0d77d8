// =============================================================================
// Financial Metrics
// =============================================================================
//
// Return and volatility columns appended after the technical indicators:
//
//   Daily_Return_t = C_t / C_{t-1} - 1
//   Log_Return_t   = ln(C_t / C_{t-1})
//   Volatility_t   = stdev_{n-1}(Daily_Return over the last `window` returns)
//                    * sqrt(trading_days)
//   Price_Change_t = C_t - O_t
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::market_data::series::OHLCV_COLUMNS;
use crate::market_data::{align, Column, OhlcvSeries};
use crate::types::{SkipReason, StageOutcome};

pub const DAILY_RETURN_COL: &str = "Daily_Return";
pub const LOG_RETURN_COL: &str = "Log_Return";
pub const VOLATILITY_COL: &str = "Volatility";
pub const PRICE_CHANGE_COL: &str = "Price_Change";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricParams {
    /// Number of daily returns in each volatility window.
    pub volatility_window: usize,
    /// Annualisation factor for volatility.
    pub trading_days: f64,
}

impl Default for MetricParams {
    fn default() -> Self {
        Self {
            volatility_window: 20,
            trading_days: 252.0,
        }
    }
}

/// Simple percentage change between consecutive closes. Row 0 is `NaN`.
pub fn daily_returns(closes: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    out.extend(closes.windows(2).map(|w| w[1] / w[0] - 1.0));
    out
}

/// Natural log of consecutive close ratios. Row 0 is `NaN`.
pub fn log_returns(closes: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return out;
    }
    out.push(f64::NAN);
    out.extend(closes.windows(2).map(|w| (w[1] / w[0]).ln()));
    out
}

/// Annualised rolling sample standard deviation of `returns`.
///
/// `returns[0]` is expected to be undefined, so the first value lands at
/// index `window`. A window shorter than 2 cannot have a sample deviation and
/// yields an all-`NaN` column.
pub fn volatility(returns: &[f64], window: usize, trading_days: f64) -> Vec<f64> {
    let n = returns.len();
    if window < 2 || n <= window {
        return vec![f64::NAN; n];
    }

    let scale = trading_days.sqrt();
    let window_f = window as f64;
    let compact: Vec<f64> = returns[1..]
        .windows(window)
        .map(|w| {
            let mean = w.iter().sum::<f64>() / window_f;
            let var = w.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (window_f - 1.0);
            var.sqrt() * scale
        })
        .collect();

    align(compact, window, n)
}

pub fn price_change(series: &OhlcvSeries) -> Vec<f64> {
    series.bars.iter().map(|b| b.close - b.open).collect()
}

/// Append `Daily_Return`, `Log_Return`, `Volatility` and `Price_Change` to a
/// copy of `series`. Same skip policy as the indicator engine.
pub fn add_all_common_financial_metrics(
    series: &OhlcvSeries,
    params: &MetricParams,
) -> StageOutcome<OhlcvSeries> {
    let missing = series.missing_of(&OHLCV_COLUMNS);
    if !missing.is_empty() {
        let reason = SkipReason::MissingColumns(missing);
        warn!(ticker = %series.ticker, %reason, "Skipping financial metrics");
        return StageOutcome::Skipped {
            data: series.clone(),
            reason,
        };
    }
    if series.is_empty() {
        warn!(ticker = %series.ticker, "Skipping financial metrics: empty series");
        return StageOutcome::Skipped {
            data: series.clone(),
            reason: SkipReason::Empty,
        };
    }

    let closes = series.closes();
    let returns = daily_returns(&closes);
    let vol = volatility(&returns, params.volatility_window, params.trading_days);

    let columns = vec![
        Column::new(DAILY_RETURN_COL, returns),
        Column::new(LOG_RETURN_COL, log_returns(&closes)),
        Column::new(VOLATILITY_COL, vol),
        Column::new(PRICE_CHANGE_COL, price_change(series)),
    ];

    debug!(ticker = %series.ticker, rows = series.len(), "Financial metrics computed");
    StageOutcome::Applied(series.with_columns(columns))
}
