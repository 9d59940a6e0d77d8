// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
//   k      = 2 / (period + 1)
//   EMA_0  = SMA of the first `period` values
//   EMA_t  = EMA_{t-1} + k * (x_t - EMA_{t-1})
// =============================================================================

/// Compact EMA: one value per input from index `period - 1`.
///
/// Empty when `period == 0` or the input is shorter than `period`. A
/// non-finite value ends the series.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let (seed, rest) = values.split_at(period);
    let k = 2.0 / (period as f64 + 1.0);

    let mut ema = seed.iter().sum::<f64>() / period as f64;
    if !ema.is_finite() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(rest.len() + 1);
    out.push(ema);
    for &x in rest {
        ema += k * (x - ema);
        if !ema.is_finite() {
            break;
        }
        out.push(ema);
    }
    out
}
