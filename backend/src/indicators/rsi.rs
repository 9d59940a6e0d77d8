// =============================================================================
// Relative Strength Index (RSI): Wilder's Smoothing
// =============================================================================
//
//   gain_t / loss_t  = positive / negative part of close_t - close_{t-1}
//   seed             = mean gain and mean loss of the first `period` deltas
//   avg_t            = (avg_{t-1} * (period - 1) + x_t) / period
//   RSI              = 100 * avg_gain / (avg_gain + avg_loss)
//
// The ratio form is the same as 100 - 100 / (1 + RS) but stays defined when
// there are no losses. A window without any movement reads 0.
// =============================================================================

use crate::market_data::align;

/// Running Wilder averages of gains and losses.
#[derive(Debug, Clone, Copy)]
struct WilderAverages {
    gain: f64,
    loss: f64,
}

impl WilderAverages {
    fn seed(deltas: &[f64]) -> Self {
        let n = deltas.len() as f64;
        let gain = deltas.iter().filter(|d| **d > 0.0).sum::<f64>() / n;
        let loss = -deltas.iter().filter(|d| **d < 0.0).sum::<f64>() / n;
        Self { gain, loss }
    }

    fn update(&mut self, delta: f64, period: f64) {
        self.gain = (self.gain * (period - 1.0) + delta.max(0.0)) / period;
        self.loss = (self.loss * (period - 1.0) + (-delta).max(0.0)) / period;
    }

    /// RSI in [0, 100], or `None` when non-finite.
    fn rsi(&self) -> Option<f64> {
        let total = self.gain + self.loss;
        let rsi = if total == 0.0 {
            0.0
        } else {
            100.0 * self.gain / total
        };
        rsi.is_finite().then_some(rsi)
    }
}

/// RSI values starting at close index `period`.
///
/// Empty when `period == 0` or there are fewer than `period + 1` closes.
/// A non-finite value truncates the series.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = deltas.split_at(period);

    let mut avgs = WilderAverages::seed(seed);
    let mut out = Vec::with_capacity(rest.len() + 1);
    let Some(first) = avgs.rsi() else {
        return out;
    };
    out.push(first);

    let period_f = period as f64;
    for &delta in rest {
        avgs.update(delta, period_f);
        match avgs.rsi() {
            Some(v) => out.push(v),
            None => break,
        }
    }
    out
}

/// RSI aligned to `closes`: the first `period` positions are `NaN`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    align(calculate_rsi(closes, period), period, closes.len())
}
