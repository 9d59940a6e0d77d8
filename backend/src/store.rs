// =============================================================================
// Flat-File Persistence
// =============================================================================
//
// Every derived table lives in one output directory:
// - `<TICKER>_processed_stock_data.csv` (augmented series, `NaN` as an
//   empty cell)
// - `<TICKER>_merged_correlation_data.csv`
// - `overall_correlation_summary.csv`
// - `daily_aggregated_sentiment.csv`
// - `common_keywords.json`
// =============================================================================

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::correlation::{CorrelationEntry, MergedRow};
use crate::error::{PipelineError, Result};
use crate::market_data::loader::{header_index, parse_trading_date, ticker_from_filename};
use crate::market_data::series::{
    CLOSE_COL, DATE_COL, HIGH_COL, LOW_COL, OPEN_COL, VOLUME_COL,
};
use crate::market_data::{Bar, Column, OhlcvSeries};
use crate::sentiment::{DailySentimentSeries, KeywordReport};
use crate::types::TickerMap;

pub const PROCESSED_SUFFIX: &str = "_processed_stock_data.csv";
pub const MERGED_SUFFIX: &str = "_merged_correlation_data.csv";
pub const SUMMARY_FILE: &str = "overall_correlation_summary.csv";
pub const DAILY_SENTIMENT_FILE: &str = "daily_aggregated_sentiment.csv";
pub const KEYWORDS_FILE: &str = "common_keywords.json";

pub fn processed_path(dir: &Path, ticker: &str) -> PathBuf {
    dir.join(format!("{ticker}{PROCESSED_SUFFIX}"))
}

pub fn merged_path(dir: &Path, ticker: &str) -> PathBuf {
    dir.join(format!("{ticker}{MERGED_SUFFIX}"))
}

fn fmt_value(v: f64) -> String {
    if v.is_finite() {
        v.to_string()
    } else {
        String::new()
    }
}

fn parse_value(field: Option<&str>) -> f64 {
    field
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// Augmented series
// ---------------------------------------------------------------------------

pub fn write_series<W: Write>(writer: W, series: &OhlcvSeries) -> Result<()> {
    let has_volume = series.missing_of(&[VOLUME_COL]).is_empty();
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let mut header = vec![DATE_COL, OPEN_COL, HIGH_COL, LOW_COL, CLOSE_COL];
    if has_volume {
        header.push(VOLUME_COL);
    }
    header.extend(series.column_names());
    wtr.write_record(&header)?;

    for (i, bar) in series.bars.iter().enumerate() {
        let mut row = vec![
            bar.date.to_string(),
            fmt_value(bar.open),
            fmt_value(bar.high),
            fmt_value(bar.low),
            fmt_value(bar.close),
        ];
        if has_volume {
            row.push(bar.volume.map(fmt_value).unwrap_or_default());
        }
        row.extend(series.columns.iter().map(|c| fmt_value(c.values[i])));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read an augmented series back. Every column other than the OHLCV source
/// columns is treated as derived; rows are kept in file order.
pub fn read_series<R: Read>(reader: R, ticker: &str) -> Result<OhlcvSeries> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let require = |name: &str| {
        header_index(&headers, name).ok_or_else(|| PipelineError::MissingColumn {
            ticker: ticker.to_string(),
            column: name.to_string(),
        })
    };
    let date = require(DATE_COL)?;
    let open = require(OPEN_COL)?;
    let high = require(HIGH_COL)?;
    let low = require(LOW_COL)?;
    let close = require(CLOSE_COL)?;
    let volume = header_index(&headers, VOLUME_COL);

    let source = [Some(date), Some(open), Some(high), Some(low), Some(close), volume];
    let derived: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| !source.contains(&Some(*i)))
        .map(|(i, name)| (i, name.to_string()))
        .collect();

    let mut bars = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); derived.len()];
    for (idx, record) in rdr.records().enumerate() {
        let record: StringRecord = record?;
        let line = idx as u64 + 2;
        let bar_date: NaiveDate = record
            .get(date)
            .and_then(parse_trading_date)
            .ok_or_else(|| PipelineError::MalformedRow {
                line,
                reason: "unparseable date".to_string(),
            })?;
        bars.push(Bar {
            date: bar_date,
            open: parse_value(record.get(open)),
            high: parse_value(record.get(high)),
            low: parse_value(record.get(low)),
            close: parse_value(record.get(close)),
            volume: volume
                .map(|i| parse_value(record.get(i)))
                .filter(|v| v.is_finite()),
        });
        for ((col, _), out) in derived.iter().zip(values.iter_mut()) {
            out.push(parse_value(record.get(*col)));
        }
    }

    let mut series = OhlcvSeries::new(ticker, bars);
    if volume.is_none() {
        series.missing_columns.push(VOLUME_COL.to_string());
    }
    series.columns = derived
        .into_iter()
        .zip(values)
        .map(|((_, name), vals)| Column::new(name, vals))
        .collect();
    Ok(series)
}

pub fn save_processed(dir: &Path, series: &OhlcvSeries) -> Result<PathBuf> {
    let path = processed_path(dir, &series.ticker);
    write_series(BufWriter::new(File::create(&path)?), series)?;
    debug!(ticker = %series.ticker, file = %path.display(), "wrote processed series");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Merged tables, summary, daily sentiment, keywords
// ---------------------------------------------------------------------------

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(PipelineError::MissingFile(path.to_path_buf()));
    }
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    let mut out = Vec::new();
    for row in rdr.deserialize() {
        out.push(row?);
    }
    Ok(out)
}

pub fn save_merged(dir: &Path, ticker: &str, rows: &[MergedRow]) -> Result<PathBuf> {
    let path = merged_path(dir, ticker);
    write_rows(&path, rows)?;
    Ok(path)
}

pub fn load_merged(dir: &Path, ticker: &str) -> Result<Vec<MergedRow>> {
    read_rows(&merged_path(dir, ticker))
}

pub fn save_summary(dir: &Path, summary: &[CorrelationEntry]) -> Result<PathBuf> {
    let path = dir.join(SUMMARY_FILE);
    if summary.is_empty() {
        // `serialize` writes headers lazily; an empty summary still needs them.
        let mut wtr = WriterBuilder::new().from_path(&path)?;
        wtr.write_record(["Ticker", "Sentiment_vs_Daily_Return_Correlation"])?;
        wtr.flush()?;
    } else {
        write_rows(&path, summary)?;
    }
    Ok(path)
}

pub fn load_summary(dir: &Path) -> Result<Vec<CorrelationEntry>> {
    read_rows(&dir.join(SUMMARY_FILE))
}

#[derive(Debug, Serialize)]
struct DailySentimentRow<'a> {
    stock: &'a str,
    publication_day: NaiveDate,
    daily_avg_sentiment: f64,
    headline_count: usize,
}

pub fn save_daily_sentiment(
    dir: &Path,
    daily: &TickerMap<DailySentimentSeries>,
) -> Result<PathBuf> {
    let rows: Vec<DailySentimentRow<'_>> = daily
        .iter()
        .flat_map(|(ticker, days)| {
            days.iter().map(move |(day, s)| DailySentimentRow {
                stock: ticker,
                publication_day: *day,
                daily_avg_sentiment: s.daily_avg_sentiment,
                headline_count: s.headline_count,
            })
        })
        .collect();
    let path = dir.join(DAILY_SENTIMENT_FILE);
    write_rows(&path, &rows)?;
    Ok(path)
}

pub fn save_keywords(dir: &Path, report: &KeywordReport) -> Result<PathBuf> {
    let path = dir.join(KEYWORDS_FILE);
    let mut file = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut file, report)?;
    file.flush()?;
    Ok(path)
}

pub fn load_keywords(dir: &Path) -> Result<KeywordReport> {
    let path = dir.join(KEYWORDS_FILE);
    if !path.exists() {
        return Err(PipelineError::MissingFile(path));
    }
    Ok(serde_json::from_reader(File::open(&path)?)?)
}

/// Every processed series in `dir`, keyed by ticker. Unreadable files are
/// logged and skipped.
pub fn load_processed_dir(dir: &Path) -> Result<TickerMap<OhlcvSeries>> {
    let mut out = TickerMap::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(dir)? {
        let Ok(name) = entry?.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(PROCESSED_SUFFIX) {
            continue;
        }
        let Some(ticker) = ticker_from_filename(&name) else {
            continue;
        };
        match File::open(dir.join(&name))
            .map_err(PipelineError::from)
            .and_then(|f| read_series(f, &ticker))
        {
            Ok(series) => {
                out.insert(ticker, series);
            }
            Err(e) => warn!(file = %name, error = %e, "unreadable processed file; skipping"),
        }
    }
    Ok(out)
}

/// Every merged correlation table in `dir`, keyed by ticker.
pub fn load_merged_dir(dir: &Path) -> Result<TickerMap<Vec<MergedRow>>> {
    let mut out = TickerMap::new();
    if !dir.is_dir() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(dir)? {
        let Ok(name) = entry?.file_name().into_string() else {
            continue;
        };
        let Some(ticker) = name.strip_suffix(MERGED_SUFFIX) else {
            continue;
        };
        match load_merged(dir, ticker) {
            Ok(rows) => {
                out.insert(ticker.to_string(), rows);
            }
            Err(e) => warn!(file = %name, error = %e, "unreadable merged table; skipping"),
        }
    }
    Ok(out)
}
