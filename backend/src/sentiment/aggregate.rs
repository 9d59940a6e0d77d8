// =============================================================================
// Daily Sentiment Aggregation
// =============================================================================
//
// Mean polarity and headline count per (ticker, publication day).
// =============================================================================

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::sentiment::headlines::HeadlineRecord;
use crate::types::TickerMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub daily_avg_sentiment: f64,
    pub headline_count: usize,
}

/// One ticker's daily sentiment, keyed and sorted by day.
pub type DailySentimentSeries = BTreeMap<NaiveDate, DailySentiment>;

/// Group scored headlines by ticker and UTC day and average their polarity.
/// Unscored records are ignored.
pub fn aggregate_daily(records: &[HeadlineRecord]) -> TickerMap<DailySentimentSeries> {
    let mut sums: TickerMap<BTreeMap<NaiveDate, (f64, usize)>> = TickerMap::new();
    for rec in records {
        let Some(score) = rec.sentiment else {
            continue;
        };
        let slot = sums
            .entry(rec.ticker.clone())
            .or_default()
            .entry(rec.publication_day)
            .or_insert((0.0, 0));
        slot.0 += score;
        slot.1 += 1;
    }

    sums.into_iter()
        .map(|(ticker, days)| {
            let series = days
                .into_iter()
                .map(|(day, (sum, count))| {
                    (
                        day,
                        DailySentiment {
                            daily_avg_sentiment: sum / count as f64,
                            headline_count: count,
                        },
                    )
                })
                .collect();
            (ticker, series)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn scored(ts: &str, ticker: &str, score: f64) -> HeadlineRecord {
        let date: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(ts).unwrap();
        let mut rec = HeadlineRecord::new(date, "h", "p", ticker);
        rec.sentiment = Some(score);
        rec
    }

    #[test]
    fn mean_per_day() {
        let records = vec![
            scored("2024-05-01T09:00:00Z", "AAPL", 0.5),
            scored("2024-05-01T12:00:00Z", "AAPL", -0.5),
            scored("2024-05-01T20:00:00Z", "AAPL", 0.2),
            scored("2024-05-02T09:00:00Z", "AAPL", 1.0),
            scored("2024-05-01T09:00:00Z", "TSLA", -0.3),
        ];
        let daily = aggregate_daily(&records);
        assert_eq!(daily.keys().collect::<Vec<_>>(), vec!["AAPL", "TSLA"]);

        let aapl = &daily["AAPL"];
        let may1 = aapl[&NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()];
        assert!((may1.daily_avg_sentiment - 0.0667).abs() < 1e-3);
        assert_eq!(may1.headline_count, 3);
        assert_eq!(aapl.len(), 2);
        assert_eq!(daily["TSLA"].len(), 1);
    }

    #[test]
    fn unscored_records_ignored() {
        let date = DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z").unwrap();
        let records = vec![HeadlineRecord::new(date, "h", "p", "AAPL")];
        assert!(aggregate_daily(&records).is_empty());
    }
}
