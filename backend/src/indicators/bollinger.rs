// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// of the same window.

use crate::market_data::align;

/// Bands for a single window.
#[derive(Debug, Clone, Copy)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Aligned band columns, one entry per input close.
#[derive(Debug, Clone)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Calculate Bollinger Bands over the trailing `period` closes.
///
/// Returns `None` when there are fewer than `period` data points or the
/// result is non-finite.
pub fn calculate_bollinger(
    closes: &[f64],
    period: usize,
    nbdev_up: f64,
    nbdev_dn: f64,
) -> Option<BollingerResult> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;

    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    let upper = middle + nbdev_up * std_dev;
    let lower = middle - nbdev_dn * std_dev;

    if upper.is_finite() && lower.is_finite() {
        Some(BollingerResult {
            upper,
            middle,
            lower,
        })
    } else {
        None
    }
}

/// Full band series. Positions before `period - 1` are `NaN`.
pub fn bollinger_series(
    closes: &[f64],
    period: usize,
    nbdev_up: f64,
    nbdev_dn: f64,
) -> BollingerSeries {
    let n = closes.len();
    let start = period.saturating_sub(1);

    let mut upper = Vec::new();
    let mut middle = Vec::new();
    let mut lower = Vec::new();
    if period > 0 {
        for end in period..=n {
            let (u, m, l) = match calculate_bollinger(&closes[..end], period, nbdev_up, nbdev_dn) {
                Some(bb) => (bb.upper, bb.middle, bb.lower),
                None => (f64::NAN, f64::NAN, f64::NAN),
            };
            upper.push(u);
            middle.push(m);
            lower.push(l);
        }
    }

    BollingerSeries {
        upper: align(upper, start, n),
        middle: align(middle, start, n),
        lower: align(lower, start, n),
    }
}
