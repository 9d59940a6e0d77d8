// =============================================================================
// Stochastic Oscillator (slow)
// =============================================================================
//
//   fast %K = 100 * (close - LL_n) / (HH_n - LL_n)      n = fastk period
//   %K      = SMA(fast %K, slowk)
//   %D      = SMA(%K, slowd)
//
// A window with no range (HH == LL) gives fast %K = 0. Both outputs are
// published from the %D lookback onward.
// =============================================================================

use crate::indicators::sma::calculate_sma;
use crate::market_data::{align, Bar};

#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Fast %K over each trailing `period`-bar window, starting at index
/// `period - 1`.
fn fast_k(bars: &[Bar], period: usize) -> Vec<f64> {
    bars.windows(period)
        .map(|w| {
            let highest = w.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = w.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            let close = w[w.len() - 1].close;
            let range = highest - lowest;
            if range > 0.0 {
                100.0 * (close - lowest) / range
            } else {
                0.0
            }
        })
        .collect()
}

pub fn stochastic_series(
    bars: &[Bar],
    fastk_period: usize,
    slowk_period: usize,
    slowd_period: usize,
) -> StochasticSeries {
    let n = bars.len();
    if fastk_period == 0 || slowk_period == 0 || slowd_period == 0 || n < fastk_period {
        return StochasticSeries {
            k: vec![f64::NAN; n],
            d: vec![f64::NAN; n],
        };
    }

    let k_start = fastk_period + slowk_period - 2;
    let lookback = k_start + slowd_period - 1;

    let slow_k = calculate_sma(&fast_k(bars, fastk_period), slowk_period);
    let slow_d = calculate_sma(&slow_k, slowd_period);

    let mut k = align(slow_k, k_start, n);
    for v in k.iter_mut().take(lookback.min(n)) {
        *v = f64::NAN;
    }
    let d = align(slow_d, lookback, n);

    StochasticSeries { k, d }
}
