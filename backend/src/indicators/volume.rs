// =============================================================================
// Volume Indicators: On-Balance Volume (OBV) and Accumulation/Distribution (AD)
// =============================================================================
//
//   OBV_0 = V_0
//   OBV_t = OBV_{t-1} + V_t   if C_t > C_{t-1}
//         = OBV_{t-1} - V_t   if C_t < C_{t-1}
//         = OBV_{t-1}         otherwise
//
//   CLV_t = ((C - L) - (H - C)) / (H - L),  0 when H == L
//   AD_t  = AD_{t-1} + CLV_t * V_t
//
// Neither indicator has a warm-up. A missing volume propagates `NaN` forward
// from the bar where it appears.
// =============================================================================

use crate::market_data::Bar;

/// On-balance volume over parallel close/volume columns.
pub fn obv_series(closes: &[f64], volumes: &[f64]) -> Vec<f64> {
    let n = closes.len().min(volumes.len());
    let mut out = Vec::with_capacity(n);
    if n == 0 {
        return out;
    }

    let mut obv = volumes[0];
    out.push(obv);
    for i in 1..n {
        if volumes[i].is_nan() {
            obv = f64::NAN;
        } else if closes[i] > closes[i - 1] {
            obv += volumes[i];
        } else if closes[i] < closes[i - 1] {
            obv -= volumes[i];
        }
        out.push(obv);
    }
    out
}

/// Chaikin accumulation/distribution line.
pub fn ad_series(bars: &[Bar]) -> Vec<f64> {
    let mut ad = 0.0;
    bars.iter()
        .map(|b| {
            let range = b.high - b.low;
            if range > 0.0 {
                let clv = ((b.close - b.low) - (b.high - b.close)) / range;
                ad += clv * b.volume.unwrap_or(f64::NAN);
            } else if b.volume.is_none() {
                ad = f64::NAN;
            }
            ad
        })
        .collect()
}
