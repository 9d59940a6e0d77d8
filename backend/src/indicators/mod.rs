// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the technical indicators appended
// to every OHLCV series. Each `*_series` function returns a vector aligned
// with its input, with `NaN` in the warm-up positions.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volume;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::market_data::series::OHLCV_COLUMNS;
use crate::market_data::{Column, OhlcvSeries};
use crate::types::{SkipReason, StageOutcome};

/// Window lengths for the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub sma_periods: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_nbdev: f64,
    pub stoch_fastk: usize,
    pub stoch_slowk: usize,
    pub stoch_slowd: usize,
    pub adx_period: usize,
    pub atr_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_periods: vec![10, 20, 50],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_nbdev: 2.0,
            stoch_fastk: 14,
            stoch_slowk: 3,
            stoch_slowd: 3,
            adx_period: 14,
            atr_period: 14,
        }
    }
}

/// Append every configured indicator column to a copy of `series`.
///
/// Column order: `SMA_<p>` per period, `RSI`, `MACD`, `MACD_Signal`,
/// `MACD_Hist`, `Upper_Band`, `Middle_Band`, `Lower_Band`, `STOCH_K`,
/// `STOCH_D`, `ADX`, `OBV`, `AD`, `ATR`.
///
/// A series missing any OHLCV source column, or with no rows, is returned
/// unmodified as [`StageOutcome::Skipped`].
pub fn add_all_common_indicators(
    series: &OhlcvSeries,
    params: &IndicatorParams,
) -> StageOutcome<OhlcvSeries> {
    let missing = series.missing_of(&OHLCV_COLUMNS);
    if !missing.is_empty() {
        let reason = SkipReason::MissingColumns(missing);
        warn!(ticker = %series.ticker, %reason, "Skipping indicators");
        return StageOutcome::Skipped {
            data: series.clone(),
            reason,
        };
    }
    if series.is_empty() {
        warn!(ticker = %series.ticker, "Skipping indicators: empty series");
        return StageOutcome::Skipped {
            data: series.clone(),
            reason: SkipReason::Empty,
        };
    }

    let closes = series.closes();
    let volumes = series.volumes();
    let bars = &series.bars;

    let mut columns = Vec::with_capacity(params.sma_periods.len() + 13);

    // --- Trend ---------------------------------------------------------------
    for &period in &params.sma_periods {
        columns.push(Column::new(
            format!("SMA_{period}"),
            sma::sma_series(&closes, period),
        ));
    }

    // --- Momentum ------------------------------------------------------------
    columns.push(Column::new("RSI", rsi::rsi_series(&closes, params.rsi_period)));

    let macd = macd::macd_series(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
    columns.push(Column::new("MACD", macd.macd));
    columns.push(Column::new("MACD_Signal", macd.signal));
    columns.push(Column::new("MACD_Hist", macd.histogram));

    // --- Volatility bands ----------------------------------------------------
    let bands = bollinger::bollinger_series(
        &closes,
        params.bollinger_period,
        params.bollinger_nbdev,
        params.bollinger_nbdev,
    );
    columns.push(Column::new("Upper_Band", bands.upper));
    columns.push(Column::new("Middle_Band", bands.middle));
    columns.push(Column::new("Lower_Band", bands.lower));

    // --- Oscillators / trend strength ----------------------------------------
    let stoch = stochastic::stochastic_series(
        bars,
        params.stoch_fastk,
        params.stoch_slowk,
        params.stoch_slowd,
    );
    columns.push(Column::new("STOCH_K", stoch.k));
    columns.push(Column::new("STOCH_D", stoch.d));
    columns.push(Column::new("ADX", adx::adx_series(bars, params.adx_period)));

    // --- Volume --------------------------------------------------------------
    columns.push(Column::new("OBV", volume::obv_series(&closes, &volumes)));
    columns.push(Column::new("AD", volume::ad_series(bars)));

    columns.push(Column::new("ATR", atr::atr_series(bars, params.atr_period)));

    debug!(
        ticker = %series.ticker,
        rows = series.len(),
        columns = columns.len(),
        "Indicators computed"
    );
    StageOutcome::Applied(series.with_columns(columns))
}
