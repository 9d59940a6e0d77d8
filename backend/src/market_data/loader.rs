// =============================================================================
// Series Loader
// =============================================================================
//
// Reads one `<TICKER>_historical_data.csv` per ticker, coerces the price
// fields to numbers, drops incomplete bars and returns a date-sorted series.
// =============================================================================

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::market_data::series::{
    Bar, OhlcvSeries, CLOSE_COL, DATE_COL, HIGH_COL, LOW_COL, OPEN_COL, VOLUME_COL,
};
use crate::types::TickerMap;

/// Counters describing what happened to the rows of one input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub malformed: usize,
    pub duplicates: usize,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp in any of the layouts found in price and news exports.
///
/// Values without an offset are taken as UTC. A bare date maps to midnight.
pub fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc().fixed_offset())
}

/// Trading date of a price row: the calendar date in the row's own offset.
pub fn parse_trading_date(raw: &str) -> Option<NaiveDate> {
    parse_datetime(raw).map(|dt| dt.date_naive())
}

/// Numeric coercion: anything that does not parse to a finite number is
/// treated as missing.
fn coerce(field: Option<&str>) -> Option<f64> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Ticker symbol from a file name: everything before the first underscore.
pub fn ticker_from_filename(file_name: &str) -> Option<String> {
    let prefix = file_name.split('_').next()?.trim();
    if prefix.is_empty() || prefix == file_name {
        None
    } else {
        Some(prefix.to_string())
    }
}

/// Locate a header case-insensitively.
pub(crate) fn header_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

struct ColumnLayout {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn parse_bar(record: &StringRecord, layout: &ColumnLayout, line: u64) -> Result<Bar> {
    let malformed = |reason: &str| PipelineError::MalformedRow {
        line,
        reason: reason.to_string(),
    };

    let date = record
        .get(layout.date)
        .and_then(parse_trading_date)
        .ok_or_else(|| malformed("unparseable date"))?;
    let open = coerce(record.get(layout.open)).ok_or_else(|| malformed("missing Open"))?;
    let high = coerce(record.get(layout.high)).ok_or_else(|| malformed("missing High"))?;
    let low = coerce(record.get(layout.low)).ok_or_else(|| malformed("missing Low"))?;
    let close = coerce(record.get(layout.close)).ok_or_else(|| malformed("missing Close"))?;
    let volume = layout.volume.and_then(|i| coerce(record.get(i)));

    Ok(Bar {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read an OHLCV table for `ticker` from any reader.
///
/// Fails with [`PipelineError::MissingColumn`] when Date or any price column
/// is absent. A missing Volume column is tolerated and recorded on the
/// returned series so downstream stages can skip with a reason.
pub fn read_series<R: Read>(reader: R, ticker: &str) -> Result<(OhlcvSeries, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let require = |name: &str| {
        header_index(&headers, name).ok_or_else(|| PipelineError::MissingColumn {
            ticker: ticker.to_string(),
            column: name.to_string(),
        })
    };

    let layout = ColumnLayout {
        date: require(DATE_COL)?,
        open: require(OPEN_COL)?,
        high: require(HIGH_COL)?,
        low: require(LOW_COL)?,
        close: require(CLOSE_COL)?,
        volume: header_index(&headers, VOLUME_COL),
    };

    let mut missing_columns = Vec::new();
    if layout.volume.is_none() {
        warn!(ticker, column = VOLUME_COL, "column not found; volume indicators will be skipped");
        missing_columns.push(VOLUME_COL.to_string());
    }

    let mut report = LoadReport::default();
    let mut bars = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        report.rows_read += 1;
        // Header is line 1.
        let line = idx as u64 + 2;
        let parsed = record
            .map_err(PipelineError::from)
            .and_then(|r| parse_bar(&r, &layout, line));
        match parsed {
            Ok(bar) => bars.push(bar),
            Err(e) => {
                debug!(ticker, error = %e, "dropping row");
                report.malformed += 1;
            }
        }
    }

    // Stable sort keeps file order among equal dates; the first one wins.
    bars.sort_by_key(|b| b.date);
    let before = bars.len();
    bars.dedup_by_key(|b| b.date);
    report.duplicates = before - bars.len();
    report.rows_kept = bars.len();

    let mut series = OhlcvSeries::new(ticker, bars);
    series.missing_columns = missing_columns;
    Ok((series, report))
}

/// Load one ticker's OHLCV file from disk.
pub fn load_series(path: &Path, ticker: &str) -> Result<(OhlcvSeries, LoadReport)> {
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    let file = File::open(path)?;
    read_series(file, ticker)
}

/// Load every `*<suffix>` file in `dir`, keyed by ticker.
///
/// A file that cannot be loaded is logged and skipped; the remaining tickers
/// are still returned. When `allow` is non-empty only those tickers load.
pub fn load_all_historical_data(
    dir: &Path,
    suffix: &str,
    allow: &[String],
) -> Result<TickerMap<OhlcvSeries>> {
    if !dir.is_dir() {
        return Err(PipelineError::MissingFile(dir.to_path_buf()));
    }

    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(suffix))
        .collect();
    names.sort();

    let mut out = TickerMap::new();
    for name in names {
        let Some(ticker) = ticker_from_filename(&name) else {
            warn!(file = %name, "cannot derive ticker from file name; skipping");
            continue;
        };
        if !allow.is_empty() && !allow.iter().any(|t| t.eq_ignore_ascii_case(&ticker)) {
            debug!(ticker = %ticker, "not in ticker allow-list; skipping");
            continue;
        }

        match load_series(&dir.join(&name), &ticker) {
            Ok((series, report)) => {
                info!(
                    ticker = %ticker,
                    file = %name,
                    rows = report.rows_kept,
                    malformed = report.malformed,
                    duplicates = report.duplicates,
                    "loaded price history"
                );
                out.insert(ticker, series);
            }
            Err(e) => {
                warn!(ticker = %ticker, file = %name, error = %e, "failed to load price history; skipping ticker");
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-03,11,12,10,11.5,11.5,2000
2024-01-02,10,11,9,10.5,10.5,1000
2024-01-04,abc,13,11,12.5,12.5,3000
2024-01-05,12,13,11,,12.5,3000
2024-01-08,13,14,12,13.5,13.5,
2024-01-03,99,99,99,99,99,99
";

    #[test]
    fn parse_datetime_variants() {
        let d = |s: &str| parse_datetime(s).map(|dt| dt.date_naive());
        let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2);
        assert_eq!(d("2024-01-02"), jan2);
        assert_eq!(d("2024-01-02 10:30:54-04:00"), jan2);
        assert_eq!(d("2024-01-02T10:30:54Z"), jan2);
        assert_eq!(d("2024-01-02 10:30:54"), jan2);
        assert!(parse_datetime("not a date").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn ticker_from_filename_uses_prefix() {
        assert_eq!(
            ticker_from_filename("AAPL_historical_data.csv"),
            Some("AAPL".to_string())
        );
        assert_eq!(ticker_from_filename("nounderscore.csv"), None);
        assert_eq!(ticker_from_filename("_x.csv"), None);
    }

    #[test]
    fn read_series_sorts_drops_and_dedups() {
        let (series, report) = read_series(CSV.as_bytes(), "AAPL").unwrap();
        assert_eq!(report.rows_read, 6);
        assert_eq!(report.malformed, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(series.len(), 3);

        let dates: Vec<String> = series.bars.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-02", "2024-01-03", "2024-01-08"]);
        // First occurrence of the duplicated date is kept.
        assert_eq!(series.bars[1].close, 11.5);
        // Volume may be missing without dropping the row.
        assert_eq!(series.bars[2].volume, None);
        assert!(series.missing_columns.is_empty());
    }

    #[test]
    fn read_series_missing_price_column_fails() {
        let csv = "Date,Open,High,Low,Volume\n2024-01-02,1,2,0.5,10\n";
        match read_series(csv.as_bytes(), "MSFT") {
            Err(PipelineError::MissingColumn { ticker, column }) => {
                assert_eq!(ticker, "MSFT");
                assert_eq!(column, "Close");
            }
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn read_series_missing_volume_is_recorded() {
        let csv = "date,open,high,low,close\n2024-01-02,1,2,0.5,1.5\n";
        let (series, _) = read_series(csv.as_bytes(), "TSLA").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.missing_columns, vec!["Volume".to_string()]);
    }

    #[test]
    fn load_all_skips_bad_files_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AAPL_historical_data.csv"), CSV).unwrap();
        std::fs::write(
            dir.path().join("MSFT_historical_data.csv"),
            "Date,Open\n2024-01-02,1\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("GOOG_historical_data.csv"), CSV).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let all = load_all_historical_data(dir.path(), "_historical_data.csv", &[]).unwrap();
        let tickers: Vec<&String> = all.keys().collect();
        assert_eq!(tickers, vec!["AAPL", "GOOG"]);

        let only = load_all_historical_data(
            dir.path(),
            "_historical_data.csv",
            &["goog".to_string()],
        )
        .unwrap();
        assert_eq!(only.keys().collect::<Vec<_>>(), vec!["GOOG"]);
    }

    #[test]
    fn load_all_missing_dir_is_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            load_all_historical_data(&missing, "_historical_data.csv", &[]),
            Err(PipelineError::MissingFile(_))
        ));
    }
}
