// =============================================================================
// Sentiment Engine
// =============================================================================
//
// Headline normalisation, lexicon polarity, daily aggregation and keyword
// statistics. Stop-words, lemma tables and the lexicon are process-wide
// statics built on first use.

pub mod aggregate;
pub mod headlines;
pub mod keywords;
pub mod lexicon;
pub mod preprocess;

pub use aggregate::{aggregate_daily, DailySentiment, DailySentimentSeries};
pub use headlines::{load_financial_news_data, HeadlineRecord};
pub use keywords::{get_common_keywords, keyword_report, KeywordReport};
pub use lexicon::{LexiconScorer, PolarityScorer};

use tracing::debug;

/// Fill in `processed_headline` (where not already cached) and `sentiment`
/// for every record.
pub fn add_sentiment_scores<S: PolarityScorer + ?Sized>(records: &mut [HeadlineRecord], scorer: &S) {
    for rec in records.iter_mut() {
        let score = scorer.polarity(rec.processed());
        rec.sentiment = Some(score);
    }
    debug!(records = records.len(), "headlines scored");
}
