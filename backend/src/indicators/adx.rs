// =============================================================================
// Average Directional Index (ADX)
// =============================================================================
//
// ADX quantifies trend **strength** regardless of direction.
//
// Calculation pipeline:
//   1. Compute +DM (positive directional movement) and -DM per bar.
//   2. Compute True Range (TR) per bar.
//   3. Apply Wilder's smoothing (period) to +DM, -DM, and TR.
//   4. Derive +DI = smoothed(+DM) / smoothed(TR) * 100
//            -DI = smoothed(-DM) / smoothed(TR) * 100
//   5. DX  = |+DI - -DI| / (+DI + -DI) * 100
//   6. ADX = Wilder's smoothed average of DX over `period` bars.
//
// The first DX lands on bar `period`, the first ADX on bar `2 * period - 1`.
// =============================================================================

use crate::indicators::atr::true_range;
use crate::market_data::{align, Bar};

/// Compute the ADX series, one value per bar from index `2 * period - 1`.
///
/// Returns an empty vec when:
/// - `period` is zero.
/// - There are fewer than `2 * period` bars (`period - 1` transitions seed
///   the running sums, then `period` DX values seed the ADX average).
/// - Any intermediate calculation produces a non-finite result. Values
///   computed before the failure are kept.
pub fn calculate_adx(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < 2 * period {
        return Vec::new();
    }

    let period_f = period as f64;

    // ------------------------------------------------------------------
    // Step 1 & 2: Raw +DM, -DM, and True Range for each consecutive pair
    // ------------------------------------------------------------------
    let transitions = bars.len() - 1;
    let mut plus_dm = Vec::with_capacity(transitions);
    let mut minus_dm = Vec::with_capacity(transitions);
    let mut tr_vals = Vec::with_capacity(transitions);

    for w in bars.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
        tr_vals.push(true_range(cur, prev.close));
    }

    // ------------------------------------------------------------------
    // Step 3-5: Wilder's smoothing of +DM, -DM, TR, then DX per bar.
    // The running sums start from `period - 1` transitions, so the first
    // smoothing step already lands on bar `period`.
    // ------------------------------------------------------------------
    let seed = period - 1;
    let mut smooth_plus_dm: f64 = plus_dm[..seed].iter().sum();
    let mut smooth_minus_dm: f64 = minus_dm[..seed].iter().sum();
    let mut smooth_tr: f64 = tr_vals[..seed].iter().sum();

    let mut dx_values: Vec<Option<f64>> = Vec::with_capacity(transitions - seed);
    for i in seed..transitions {
        smooth_plus_dm = smooth_plus_dm - smooth_plus_dm / period_f + plus_dm[i];
        smooth_minus_dm = smooth_minus_dm - smooth_minus_dm / period_f + minus_dm[i];
        smooth_tr = smooth_tr - smooth_tr / period_f + tr_vals[i];
        dx_values.push(compute_dx(smooth_plus_dm, smooth_minus_dm, smooth_tr));
    }

    // ------------------------------------------------------------------
    // Step 6: ADX = Wilder's smoothed average of DX. An undefined DX counts
    // as 0 in the seed and leaves the running ADX unchanged afterwards.
    // ------------------------------------------------------------------
    let adx_seed: f64 = dx_values[..period].iter().flatten().sum::<f64>() / period_f;
    if !adx_seed.is_finite() {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(dx_values.len() - period + 1);
    result.push(adx_seed);

    let mut adx = adx_seed;
    for dx in &dx_values[period..] {
        if let Some(dx) = dx {
            adx = (adx * (period_f - 1.0) + dx) / period_f;
        }
        if !adx.is_finite() {
            break;
        }
        result.push(adx);
    }

    result
}

/// ADX aligned to `bars`: `NaN` before index `2 * period - 1`.
pub fn adx_series(bars: &[Bar], period: usize) -> Vec<f64> {
    let start = (2 * period).saturating_sub(1);
    align(calculate_adx(bars, period), start, bars.len())
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Values this close to zero are treated as zero.
const NEAR_ZERO: f64 = 1e-8;

/// Compute DX from smoothed +DM, -DM, and TR values.
///
/// `None` when the true range or the DI sum is (near) zero. Non-finite input
/// yields a non-finite DX, which ends the ADX series.
fn compute_dx(smooth_plus_dm: f64, smooth_minus_dm: f64, smooth_tr: f64) -> Option<f64> {
    if smooth_tr.abs() < NEAR_ZERO {
        return None;
    }

    let plus_di = (smooth_plus_dm / smooth_tr) * 100.0;
    let minus_di = (smooth_minus_dm / smooth_tr) * 100.0;

    let di_sum = plus_di + minus_di;
    if di_sum.abs() < NEAR_ZERO {
        return None;
    }

    Some(((plus_di - minus_di).abs() / di_sum) * 100.0)
}
