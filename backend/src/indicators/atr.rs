// =============================================================================
// Average True Range (ATR): Wilder's Smoothing Method
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// Default period: 14
// =============================================================================

use crate::market_data::{align, Bar};

/// True range of `bar` given the previous bar's close.
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    let hl = bar.high - bar.low;
    let hc = (bar.high - prev_close).abs();
    let lc = (bar.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Compute the ATR series (oldest first) using Wilder's smoothing.
///
/// The returned vector starts at bar index `period`: the first bar has no
/// previous close, so `period` true ranges need `period + 1` bars.
///
/// Returns an empty vec when `period` is zero or there are fewer than
/// `period + 1` bars. A non-finite value ends the series.
pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period + 1 {
        return Vec::new();
    }

    // --- Step 1: Compute True Range for each consecutive pair ----------------
    let tr_values: Vec<f64> = bars
        .windows(2)
        .map(|w| true_range(&w[1], w[0].close))
        .collect();

    // --- Step 2: Seed ATR with SMA of first `period` TR values ---------------
    let seed: f64 = tr_values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return Vec::new();
    }

    // --- Step 3: Wilder's smoothing for remaining TR values ------------------
    let period_f = period as f64;
    let mut result = Vec::with_capacity(tr_values.len() - period + 1);
    result.push(seed);

    let mut atr = seed;
    for &tr in &tr_values[period..] {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
        if !atr.is_finite() {
            break;
        }
        result.push(atr);
    }

    result
}

/// ATR aligned to `bars`: `NaN` for the first `period` positions.
pub fn atr_series(bars: &[Bar], period: usize) -> Vec<f64> {
    align(calculate_atr(bars, period), period, bars.len())
}
