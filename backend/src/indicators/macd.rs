// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD line = EMA(fast) - EMA(slow), both starting on bar `slow - 1`
//   Signal    = EMA(signal) of the MACD line
//   Histogram = MACD line - Signal
//
// All three outputs share one lookback (`slow + signal - 2`) so a row either
// has the full triple or none of it.
// =============================================================================

use crate::indicators::ema::calculate_ema;
use crate::market_data::align;

/// Aligned MACD output, one entry per input close.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdSeries {
    fn undefined(len: usize) -> Self {
        Self {
            macd: vec![f64::NAN; len],
            signal: vec![f64::NAN; len],
            histogram: vec![f64::NAN; len],
        }
    }
}

/// Compute MACD / signal / histogram for `closes`.
///
/// A fast period longer than the slow one is swapped. Any zero period, or an
/// input too short for the combined lookback, yields all-`NaN` columns.
pub fn macd_series(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdSeries {
    let n = closes.len();
    if fast_period == 0 || slow_period == 0 || signal_period == 0 {
        return MacdSeries::undefined(n);
    }
    let (fast_period, slow_period) = if fast_period > slow_period {
        (slow_period, fast_period)
    } else {
        (fast_period, slow_period)
    };

    let lookback = slow_period + signal_period - 2;
    if n <= lookback {
        return MacdSeries::undefined(n);
    }

    // Both EMAs start on bar `slow - 1`; the fast one is seeded with the SMA
    // of the `fast` closes ending there.
    let line_start = slow_period - 1;
    let fast = calculate_ema(&closes[slow_period - fast_period..], fast_period);
    let slow = calculate_ema(closes, slow_period);
    let mut line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    // A non-finite close truncates an EMA; the rest of the line is undefined.
    line.resize(n - line_start, f64::NAN);

    let signal_compact = calculate_ema(&line, signal_period);
    let signal = align(signal_compact, lookback, n);

    let mut out = MacdSeries::undefined(n);
    for i in lookback..n {
        out.macd[i] = line[i - line_start];
        out.signal[i] = signal[i];
        out.histogram[i] = out.macd[i] - signal[i];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.2).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn macd_lookback_is_shared() {
        let closes = wave(100);
        let m = macd_series(&closes, 12, 26, 9);
        let lookback = 26 + 9 - 2;
        for col in [&m.macd, &m.signal, &m.histogram] {
            assert_eq!(col.len(), 100);
            assert!(col[..lookback].iter().all(|v| v.is_nan()));
            assert!(col[lookback..].iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let closes = wave(80);
        let m = macd_series(&closes, 12, 26, 9);
        for i in 33..80 {
            assert!((m.histogram[i] - (m.macd[i] - m.signal[i])).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_hand_computed_small_periods() {
        // slow EMA(3) at bars 2..4: 7/3, 14/3, 47/6
        // fast EMA(2) seeded at bar 2 with mean(2, 4): 3, 17/3, 83/9
        // line: 2/3, 1, 25/18 ; signal EMA(2) from bar 3: 5/6, 65/54
        let closes = [1.0, 2.0, 4.0, 7.0, 11.0];
        let m = macd_series(&closes, 2, 3, 2);
        assert!(m.macd[..3].iter().all(|v| v.is_nan()));
        assert!((m.macd[3] - 1.0).abs() < 1e-12);
        assert!((m.signal[3] - 5.0 / 6.0).abs() < 1e-12);
        assert!((m.histogram[3] - 1.0 / 6.0).abs() < 1e-12);
        assert!((m.macd[4] - 25.0 / 18.0).abs() < 1e-12);
        assert!((m.signal[4] - 65.0 / 54.0).abs() < 1e-12);
        assert!((m.histogram[4] - 5.0 / 27.0).abs() < 1e-12);
    }

    #[test]
    fn macd_fast_ema_starts_with_slow() {
        // Fast EMA seeded from closes 14..26, so both compact EMAs start on bar 25.
        let closes = wave(60);
        let m = macd_series(&closes, 12, 26, 9);
        let fast = calculate_ema(&closes[14..], 12);
        let slow = calculate_ema(&closes, 26);
        assert!((m.macd[50] - (fast[50 - 25] - slow[50 - 25])).abs() < 1e-12);
    }

    #[test]
    fn macd_flat_prices_are_zero() {
        let closes = vec![42.0; 60];
        let m = macd_series(&closes, 12, 26, 9);
        assert!(m.macd[40].abs() < 1e-12);
        assert!(m.signal[40].abs() < 1e-12);
        assert!(m.histogram[40].abs() < 1e-12);
    }

    #[test]
    fn macd_insufficient_data() {
        let m = macd_series(&wave(33), 12, 26, 9);
        assert!(m.macd.iter().all(|v| v.is_nan()));
        let m = macd_series(&wave(50), 12, 0, 9);
        assert!(m.signal.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn macd_swaps_inverted_periods() {
        let closes = wave(80);
        let a = macd_series(&closes, 12, 26, 9);
        let b = macd_series(&closes, 26, 12, 9);
        assert_eq!(a.macd[70], b.macd[70]);
    }
}
