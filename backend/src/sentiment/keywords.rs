// =============================================================================
// Keyword Frequency
// =============================================================================
//
// Word and n-gram counts over the processed headline corpus.
// =============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top unigrams and bigrams, as written to `common_keywords.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordReport {
    pub unigrams: Vec<(String, usize)>,
    pub bigrams: Vec<(String, usize)>,
}

/// The `top_n` most frequent `n_gram`-token sequences across `texts`.
///
/// Tokens are whitespace-separated; an n-gram is its tokens joined by a single
/// space. Ties keep the order of first occurrence. `n_gram == 0` yields
/// nothing.
pub fn get_common_keywords<'a, I>(texts: I, top_n: usize, n_gram: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    if n_gram == 0 || top_n == 0 {
        return Vec::new();
    }

    let tokens: Vec<&str> = texts
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect();

    // gram -> (count, first position)
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (pos, window) in tokens.windows(n_gram).enumerate() {
        counts
            .entry(window.join(" "))
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, pos));
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(gram, (count, first))| (gram, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(gram, count, _)| (gram, count))
        .collect()
}

pub fn keyword_report<'a, I>(texts: I, top_n: usize) -> KeywordReport
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    KeywordReport {
        unigrams: get_common_keywords(texts.clone(), top_n, 1),
        bigrams: get_common_keywords(texts, top_n, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_unigrams() {
        let corpus = ["buy buy sell", "buy hold"];
        assert_eq!(
            get_common_keywords(corpus, 2, 1),
            vec![("buy".to_string(), 3), ("sell".to_string(), 1)]
        );
    }

    #[test]
    fn bigrams_joined_by_space() {
        let corpus = ["stock price rise", "stock price fall"];
        let top = get_common_keywords(corpus, 1, 2);
        assert_eq!(top, vec![("stock price".to_string(), 2)]);
    }

    #[test]
    fn zero_n_gram_is_empty() {
        assert!(get_common_keywords(["a b c"], 5, 0).is_empty());
    }

    #[test]
    fn report_has_both_orders() {
        let corpus = vec!["apple share rise", "apple share fall"];
        let report = keyword_report(corpus.iter().copied(), 3);
        assert_eq!(report.unigrams[0], ("apple".to_string(), 2));
        assert_eq!(report.bigrams[0], ("apple share".to_string(), 2));
    }
}
