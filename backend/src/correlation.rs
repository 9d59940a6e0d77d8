// =============================================================================
// Sentiment / Return Correlation
// =============================================================================
//
// Inner-joins a ticker's daily sentiment with its Daily_Return column on the
// calendar day, then computes the Pearson coefficient of the pairs. Days with
// no return (weekends, holidays, the first bar) fall out of the join.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::market_data::OhlcvSeries;
use crate::metrics::DAILY_RETURN_COL;
use crate::sentiment::DailySentimentSeries;
use crate::types::TickerMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub daily_avg_sentiment: f64,
    #[serde(rename = "Daily_Return")]
    pub daily_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Sentiment_vs_Daily_Return_Correlation")]
    pub correlation: f64,
}

/// Rows for days present in both inputs with a defined return, in date order.
pub fn merge_sentiment_returns(
    series: &OhlcvSeries,
    sentiment: &DailySentimentSeries,
) -> Vec<MergedRow> {
    let Some(returns) = series.column(DAILY_RETURN_COL) else {
        return Vec::new();
    };

    series
        .bars
        .iter()
        .zip(returns)
        .filter(|(_, r)| r.is_finite())
        .filter_map(|(bar, &r)| {
            sentiment.get(&bar.date).map(|s| MergedRow {
                date: bar.date,
                daily_avg_sentiment: s.daily_avg_sentiment,
                daily_return: r,
            })
        })
        .collect()
}

// Checked on the values: a constant column's computed variance need not be 0.
fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Pearson correlation coefficient of two equal-length samples.
///
/// Returns `None` for fewer than two pairs or when either sample has zero
/// variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    if is_constant(xs) || is_constant(ys) {
        return None;
    }
    let n_f = n as f64;
    let mean_x = xs.iter().sum::<f64>() / n_f;
    let mean_y = ys.iter().sum::<f64>() / n_f;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Correlation of a merged table, with the reason when it is undefined.
pub fn correlate(ticker: &str, merged: &[MergedRow]) -> Result<f64> {
    if merged.len() < 2 {
        return Err(PipelineError::InsufficientOverlap {
            ticker: ticker.to_string(),
            pairs: merged.len(),
        });
    }
    let sentiment: Vec<f64> = merged.iter().map(|r| r.daily_avg_sentiment).collect();
    let returns: Vec<f64> = merged.iter().map(|r| r.daily_return).collect();
    pearson(&sentiment, &returns).ok_or_else(|| PipelineError::UndefinedCorrelation {
        ticker: ticker.to_string(),
    })
}

/// Per-ticker merged tables plus the summary of defined coefficients.
#[derive(Debug, Clone, Default)]
pub struct CorrelationResult {
    pub merged: TickerMap<Vec<MergedRow>>,
    pub summary: Vec<CorrelationEntry>,
}

/// Merge and correlate every ticker that has both prices and sentiment.
/// Tickers whose coefficient is undefined are logged and left out of the
/// summary; their merged table is still returned.
pub fn correlate_all(
    series: &TickerMap<OhlcvSeries>,
    sentiment: &TickerMap<DailySentimentSeries>,
) -> CorrelationResult {
    let mut out = CorrelationResult::default();

    for (ticker, s) in series {
        let Some(daily) = sentiment.get(&ticker.to_ascii_uppercase()) else {
            warn!(ticker = %ticker, "no headlines for ticker; correlation skipped");
            continue;
        };
        let merged = merge_sentiment_returns(s, daily);
        match correlate(ticker, &merged) {
            Ok(r) => {
                info!(ticker = %ticker, pairs = merged.len(), correlation = r, "correlation computed");
                out.summary.push(CorrelationEntry {
                    ticker: ticker.clone(),
                    correlation: r,
                });
            }
            Err(e) => warn!(ticker = %ticker, error = %e, "correlation excluded"),
        }
        out.merged.insert(ticker.clone(), merged);
    }

    out.summary.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    out
}
