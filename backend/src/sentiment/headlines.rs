// =============================================================================
// News Headline Loading
// =============================================================================
//
// Expected columns: `date`, `headline`, `publisher`, `stock` (`ticker` is
// accepted instead of `stock`). An optional `processed_headline` column is
// taken as an already-normalised cache and never recomputed.
// =============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::market_data::loader::header_index;
use crate::market_data::{parse_datetime, LoadReport};
use crate::sentiment::preprocess::preprocess_text;

const NEWS_SOURCE: &str = "news";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineRecord {
    pub date: DateTime<FixedOffset>,
    pub headline: String,
    pub publisher: String,
    /// Upper-cased ticker symbol.
    pub ticker: String,
    /// Calendar day of `date` in UTC.
    pub publication_day: NaiveDate,
    pub processed_headline: Option<String>,
    pub sentiment: Option<f64>,
}

impl HeadlineRecord {
    pub fn new(
        date: DateTime<FixedOffset>,
        headline: impl Into<String>,
        publisher: impl Into<String>,
        ticker: &str,
    ) -> Self {
        Self {
            date,
            headline: headline.into(),
            publisher: publisher.into(),
            ticker: ticker.trim().to_ascii_uppercase(),
            publication_day: date.with_timezone(&Utc).date_naive(),
            processed_headline: None,
            sentiment: None,
        }
    }

    /// Normalised headline, computed on first access and cached.
    pub fn processed(&mut self) -> &str {
        self.processed_headline
            .get_or_insert_with(|| preprocess_text(&self.headline))
            .as_str()
    }
}

struct NewsLayout {
    date: usize,
    headline: usize,
    publisher: Option<usize>,
    ticker: usize,
    processed: Option<usize>,
}

fn parse_headline(record: &StringRecord, layout: &NewsLayout, line: u64) -> Result<HeadlineRecord> {
    let malformed = |reason: &str| PipelineError::MalformedRow {
        line,
        reason: reason.to_string(),
    };

    let date = record
        .get(layout.date)
        .and_then(parse_datetime)
        .ok_or_else(|| malformed("unparseable date"))?;
    let headline = record
        .get(layout.headline)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| malformed("empty headline"))?;
    let ticker = record
        .get(layout.ticker)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| malformed("empty ticker"))?;
    let publisher = layout
        .publisher
        .and_then(|i| record.get(i))
        .unwrap_or_default();

    let mut out = HeadlineRecord::new(date, headline, publisher, ticker);
    out.processed_headline = layout
        .processed
        .and_then(|i| record.get(i))
        .map(str::to_string);
    Ok(out)
}

/// Read headline records from any reader, dropping malformed rows.
pub fn read_headlines<R: Read>(reader: R) -> Result<(Vec<HeadlineRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let require = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| header_index(&headers, n))
            .ok_or_else(|| PipelineError::MissingColumn {
                ticker: NEWS_SOURCE.to_string(),
                column: names[0].to_string(),
            })
    };

    let layout = NewsLayout {
        date: require(&["date"])?,
        headline: require(&["headline"])?,
        publisher: header_index(&headers, "publisher"),
        ticker: require(&["stock", "ticker"])?,
        processed: header_index(&headers, "processed_headline"),
    };

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        report.rows_read += 1;
        let line = idx as u64 + 2;
        let parsed = record
            .map_err(PipelineError::from)
            .and_then(|r| parse_headline(&r, &layout, line));
        match parsed {
            Ok(rec) => records.push(rec),
            Err(e) => {
                debug!(error = %e, "dropping headline row");
                report.malformed += 1;
            }
        }
    }
    report.rows_kept = records.len();
    Ok((records, report))
}

/// Load the headline file at `path`.
pub fn load_financial_news_data(path: &Path) -> Result<Vec<HeadlineRecord>> {
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    let (records, report) = read_headlines(File::open(path)?)?;
    info!(
        file = %path.display(),
        rows = report.rows_kept,
        malformed = report.malformed,
        "loaded headlines"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEWS: &str = "\
,headline,url,publisher,date,stock
0,Apple's strong earnings boost stock.,u1,Reuters,2023-01-10 10:00:00-04:00,AAPL
1,Tesla recalls vehicles,u2,Bloomberg,2023-01-10 22:30:00-04:00,tsla
2,,u3,WSJ,2023-01-11 09:00:00-04:00,META
3,Bad date,u4,CNBC,yesterday,AAPL
";

    #[test]
    fn reads_and_derives_utc_day() {
        let (records, report) = read_headlines(NEWS.as_bytes()).unwrap();
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.malformed, 2);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].ticker, "AAPL");
        assert_eq!(records[0].publisher, "Reuters");
        assert_eq!(
            records[0].publication_day,
            NaiveDate::from_ymd_opt(2023, 1, 10).unwrap()
        );
        // 22:30 at -04:00 is already the next day in UTC.
        assert_eq!(records[1].ticker, "TSLA");
        assert_eq!(
            records[1].publication_day,
            NaiveDate::from_ymd_opt(2023, 1, 11).unwrap()
        );
    }

    #[test]
    fn ticker_alias_and_cached_processed_column() {
        let csv = "date,headline,ticker,processed_headline\n\
                   2023-02-01,Whatever Text,MSFT,cached value\n";
        let (mut records, _) = read_headlines(csv.as_bytes()).unwrap();
        assert_eq!(records[0].ticker, "MSFT");
        assert_eq!(records[0].publisher, "");
        assert_eq!(records[0].processed(), "cached value");
    }

    #[test]
    fn processed_is_computed_once() {
        let (mut records, _) = read_headlines(NEWS.as_bytes()).unwrap();
        let rec = &mut records[0];
        assert!(rec.processed_headline.is_none());
        assert_eq!(rec.processed(), "apple strong earnings boost stock");
        rec.headline = "changed".into();
        assert_eq!(rec.processed(), "apple strong earnings boost stock");
    }

    #[test]
    fn missing_required_column() {
        let csv = "date,headline,publisher\n2023-01-01,x,y\n";
        assert!(matches!(
            read_headlines(csv.as_bytes()),
            Err(PipelineError::MissingColumn { column, .. }) if column == "stock"
        ));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_financial_news_data(&dir.path().join("news.csv")),
            Err(PipelineError::MissingFile(_))
        ));
    }
}
