// =============================================================================
// Batch Pipeline
// =============================================================================
//
// load prices -> indicators -> metrics -> write processed series
// load headlines -> normalise + score -> daily aggregate -> keywords
// merge sentiment with returns -> correlations -> write tables
//
// Every failure below the output directory is scoped to one ticker or one
// file: it is logged and the batch moves on.
// =============================================================================

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::correlation::correlate_all;
use crate::error::Result;
use crate::indicators::add_all_common_indicators;
use crate::market_data::{load_all_historical_data, OhlcvSeries};
use crate::metrics::add_all_common_financial_metrics;
use crate::pipeline_config::PipelineConfig;
use crate::sentiment::{
    add_sentiment_scores, aggregate_daily, keyword_report, load_financial_news_data,
    HeadlineRecord, KeywordReport, LexiconScorer, PolarityScorer,
};
use crate::store;
use crate::types::TickerMap;

/// What a batch run did, ticker by ticker.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Tickers whose processed series was written.
    pub processed: Vec<String>,
    /// Stages skipped or tickers left out, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Tickers with a defined correlation.
    pub correlated: Vec<String>,
    pub headlines: usize,
}

/// Run the whole batch with the built-in lexicon scorer.
pub fn run_batch(cfg: &PipelineConfig) -> Result<BatchReport> {
    run_batch_with(cfg, &LexiconScorer)
}

pub fn run_batch_with<S: PolarityScorer + ?Sized>(
    cfg: &PipelineConfig,
    scorer: &S,
) -> Result<BatchReport> {
    std::fs::create_dir_all(&cfg.output_dir)?;
    let out_dir = cfg.output_dir.as_path();
    let mut report = BatchReport::default();

    // --- Prices --------------------------------------------------------------
    let raw = match load_all_historical_data(&cfg.data_dir, &cfg.price_suffix, &cfg.tickers) {
        Ok(map) => map,
        Err(e) => {
            warn!(dir = %cfg.data_dir.display(), error = %e, "no price data loaded");
            TickerMap::new()
        }
    };
    let augmented = process_prices(raw, cfg, out_dir, &mut report);

    // --- Headlines -----------------------------------------------------------
    let mut headlines = load_headlines(&cfg.news_file, &cfg.tickers);
    report.headlines = headlines.len();
    add_sentiment_scores(&mut headlines, scorer);

    let daily = aggregate_daily(&headlines);
    if let Err(e) = store::save_daily_sentiment(out_dir, &daily) {
        warn!(error = %e, "failed to write daily sentiment");
    }

    let keywords = corpus_keywords(&headlines, cfg.keyword_top_n);
    if let Err(e) = store::save_keywords(out_dir, &keywords) {
        warn!(error = %e, "failed to write keyword report");
    }

    // --- Correlation ---------------------------------------------------------
    let correlations = correlate_all(&augmented, &daily);
    for (ticker, rows) in &correlations.merged {
        if let Err(e) = store::save_merged(out_dir, ticker, rows) {
            warn!(ticker = %ticker, error = %e, "failed to write merged table");
        }
    }
    if let Err(e) = store::save_summary(out_dir, &correlations.summary) {
        warn!(error = %e, "failed to write correlation summary");
    }
    report.correlated = correlations
        .summary
        .iter()
        .map(|e| e.ticker.clone())
        .collect();

    info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        correlated = report.correlated.len(),
        headlines = report.headlines,
        output = %out_dir.display(),
        "batch complete"
    );
    Ok(report)
}

/// Indicators then metrics for every ticker; writes each processed series.
/// A skipped stage is recorded and the series carries on without its columns.
fn process_prices(
    raw: TickerMap<OhlcvSeries>,
    cfg: &PipelineConfig,
    out_dir: &Path,
    report: &mut BatchReport,
) -> TickerMap<OhlcvSeries> {
    let indicator_params = cfg.indicator_params();
    let metric_params = cfg.metric_params();
    let mut out = TickerMap::new();

    for (ticker, series) in raw {
        let with_indicators = add_all_common_indicators(&series, &indicator_params);
        if let Some(reason) = with_indicators.skip_reason() {
            report.skipped.push((ticker.clone(), reason.to_string()));
        }
        let full = add_all_common_financial_metrics(&with_indicators.into_inner(), &metric_params);
        if let Some(reason) = full.skip_reason() {
            report.skipped.push((ticker.clone(), reason.to_string()));
        }
        let full = full.into_inner();

        match store::save_processed(out_dir, &full) {
            Ok(path) => {
                info!(ticker = %ticker, file = %path.display(), rows = full.len(), "processed series written");
                report.processed.push(ticker.clone());
                out.insert(ticker, full);
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "failed to write processed series; skipping ticker");
                report.skipped.push((ticker, e.to_string()));
            }
        }
    }
    out
}

fn load_headlines(path: &Path, allow: &[String]) -> Vec<HeadlineRecord> {
    let mut records = match load_financial_news_data(path) {
        Ok(records) => records,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "no headlines loaded; sentiment outputs will be empty");
            return Vec::new();
        }
    };
    if !allow.is_empty() {
        records.retain(|r| allow.iter().any(|t| t.eq_ignore_ascii_case(&r.ticker)));
    }
    records
}

fn corpus_keywords(headlines: &[HeadlineRecord], top_n: usize) -> KeywordReport {
    let texts: Vec<&str> = headlines
        .iter()
        .filter_map(|r| r.processed_headline.as_deref())
        .collect();
    keyword_report(texts.iter().copied(), top_n)
}

/// Top keywords of the configured headline file, for the CLI.
pub fn keywords_for(cfg: &PipelineConfig, top_n: usize, n_gram: usize) -> Vec<(String, usize)> {
    let mut headlines = load_headlines(&cfg.news_file, &cfg.tickers);
    for rec in headlines.iter_mut() {
        rec.processed();
    }
    crate::sentiment::get_common_keywords(
        headlines
            .iter()
            .filter_map(|r| r.processed_headline.as_deref()),
        top_n,
        n_gram,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use std::fmt::Write as _;

    fn price_csv(n: usize, with_volume: bool) -> String {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut out = String::from(if with_volume {
            "Date,Open,High,Low,Close,Volume\n"
        } else {
            "Date,Open,High,Low,Close\n"
        });
        for i in 0..n {
            let c = 100.0 + (i as f64 * 0.45).sin() * 3.0 + i as f64 * 0.02;
            let date = start + Days::new(i as u64);
            write!(out, "{date},{},{},{},{c}", c - 0.1, c + 1.0, c - 1.0).unwrap();
            if with_volume {
                write!(out, ",{}", 1000 + i * 3).unwrap();
            }
            out.push('\n');
        }
        out
    }

    const NEWS: &str = "\
headline,publisher,date,stock
Strong profit growth,Reuters,2024-01-03 10:00:00-05:00,AAPL
Shares crash on fraud probe,WSJ,2024-01-04 10:00:00-05:00,AAPL
Analysts upgrade after record quarter,CNBC,2024-01-05 10:00:00-05:00,AAPL
Weak outlook worries investors,CNBC,2024-01-08 10:00:00-05:00,AAPL
Unrelated ticker news,CNBC,2024-01-08 10:00:00-05:00,ZZZZ
";

    fn setup() -> (tempfile::TempDir, PipelineConfig) {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("raw");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("AAPL_historical_data.csv"), price_csv(80, true)).unwrap();
        std::fs::write(data.join("MSFT_historical_data.csv"), price_csv(80, false)).unwrap();
        std::fs::write(data.join("BAD_historical_data.csv"), "Date,Open\n2024-01-01,1\n").unwrap();
        std::fs::write(root.path().join("news.csv"), NEWS).unwrap();

        let cfg = PipelineConfig {
            data_dir: data,
            news_file: root.path().join("news.csv"),
            output_dir: root.path().join("out"),
            ..PipelineConfig::default()
        };
        (root, cfg)
    }

    #[test]
    fn batch_writes_every_output() {
        let (_root, cfg) = setup();
        let report = run_batch(&cfg).unwrap();

        assert_eq!(report.processed, vec!["AAPL", "MSFT"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "MSFT");
        assert!(report.skipped[0].1.contains("Volume"));
        assert_eq!(report.correlated, vec!["AAPL"]);
        assert_eq!(report.headlines, 5);

        let out = &cfg.output_dir;
        assert!(out.join("AAPL_processed_stock_data.csv").exists());
        assert!(out.join("MSFT_processed_stock_data.csv").exists());
        assert!(out.join("AAPL_merged_correlation_data.csv").exists());
        assert!(out.join(store::DAILY_SENTIMENT_FILE).exists());
        assert!(out.join(store::KEYWORDS_FILE).exists());

        let summary = store::load_summary(out).unwrap();
        assert_eq!(summary.len(), 1);
        assert!((-1.0..=1.0).contains(&summary[0].correlation));

        let merged = store::load_merged(out, "AAPL").unwrap();
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn series_without_volume_is_written_without_indicators() {
        let (_root, cfg) = setup();
        run_batch(&cfg).unwrap();

        let written = store::load_processed_dir(&cfg.output_dir).unwrap();
        let msft = &written["MSFT"];
        assert_eq!(msft.len(), 80);
        assert!(msft.column("SMA_10").is_none());
        assert!(msft.column("OBV").is_none());
        let returns = msft.column(crate::metrics::DAILY_RETURN_COL).unwrap();
        assert!(returns[0].is_nan() && returns[1].is_finite());
        assert!(written["AAPL"].column("SMA_10").is_some());
    }

    #[test]
    fn missing_inputs_do_not_abort() {
        let root = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig {
            data_dir: root.path().join("nope"),
            news_file: root.path().join("nope.csv"),
            output_dir: root.path().join("out"),
            ..PipelineConfig::default()
        };
        let report = run_batch(&cfg).unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(report.headlines, 0);
        assert!(store::load_summary(&cfg.output_dir).unwrap().is_empty());
    }

    #[test]
    fn allow_list_filters_tickers_and_headlines() {
        let (_root, mut cfg) = setup();
        cfg.tickers = vec!["MSFT".to_string()];
        let report = run_batch(&cfg).unwrap();
        assert_eq!(report.processed, vec!["MSFT"]);
        assert!(report.correlated.is_empty());
        assert_eq!(report.headlines, 0);
    }

    #[test]
    fn keywords_from_cli_helper() {
        let (_root, cfg) = setup();
        let top = keywords_for(&cfg, 3, 1);
        assert_eq!(top.len(), 3);
        assert!(top.iter().all(|(_, count)| *count >= 1));
    }
}
