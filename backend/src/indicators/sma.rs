// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
//   SMA_t = (x_{t-period+1} + ... + x_t) / period
//
// Each window is summed on its own so a single NaN only poisons the windows
// that actually contain it.
// =============================================================================

use crate::market_data::align;

/// Compact SMA: one value per full window, starting at index `period - 1`.
///
/// Returns an empty vec when `period == 0` or the input is shorter than
/// `period`.
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let period_f = period as f64;
    values
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period_f)
        .collect()
}

/// SMA aligned to the input: `NaN` for positions `0..period - 1`.
pub fn sma_series(values: &[f64], period: usize) -> Vec<f64> {
    align(
        calculate_sma(values, period),
        period.saturating_sub(1),
        values.len(),
    )
}
