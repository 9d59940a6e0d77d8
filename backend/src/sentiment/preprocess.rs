// =============================================================================
// Headline Normalisation
// =============================================================================
//
// Lowercase, strip everything but letters and whitespace, drop stop-words and
// very short tokens, then reduce each token to its noun lemma.
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

static NON_ALPHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]").expect("static regex is valid"));

/// NLTK English stop-word list.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
        "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
        "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
        "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
        "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
        "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
        "with", "about", "against", "between", "into", "through", "during", "before", "after",
        "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
        "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o", "re",
        "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn",
        "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma",
        "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
        "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
        "wouldn't",
    ]
    .into_iter()
    .collect()
});

/// Plurals that suffix rules get wrong.
static IRREGULAR_NOUNS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("men", "man"),
        ("women", "woman"),
        ("children", "child"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("analyses", "analysis"),
        ("crises", "crisis"),
        ("theses", "thesis"),
        ("indices", "index"),
        ("matrices", "matrix"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("oxen", "ox"),
    ]
    .into_iter()
    .collect()
});

/// Words whose trailing `s` is not a plural marker.
static INVARIANT: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "news", "series", "species", "earnings", "always", "perhaps", "various", "previous",
        "famous", "serious", "gas", "bias", "chaos", "lens", "thus", "yes", "plus", "minus",
        "bonus", "status", "focus", "census", "virus", "campus", "nexus", "consensus",
        "savings", "headquarters", "means", "economics", "politics", "physics", "ethics",
        "analytics", "logistics", "semiconductors", "alias", "atlas", "canvas",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Noun lemma of a lowercase token: irregular table first, then the usual
/// plural suffix rules.
pub fn lemmatize(token: &str) -> String {
    if let Some(lemma) = IRREGULAR_NOUNS.get(token) {
        return (*lemma).to_string();
    }
    if INVARIANT.contains(token) || token.len() <= 3 {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "ches", "shes", "xes", "zes"] {
        if token.ends_with(suffix) {
            return token[..token.len() - 2].to_string();
        }
    }
    if let Some(stem) = token.strip_suffix("men") {
        return format!("{stem}man");
    }
    if token.ends_with('s') && !["ss", "us", "is"].iter().any(|s| token.ends_with(s)) {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

/// Normalise one headline into space-separated lemmas.
pub fn preprocess_text(text: &str) -> String {
    let lower = text.to_lowercase();
    let cleaned = NON_ALPHA.replace_all(&lower, "");
    cleaned
        .split_whitespace()
        .filter(|tok| tok.len() > 2 && !is_stop_word(tok))
        .map(lemmatize)
        .collect::<Vec<_>>()
        .join(" ")
}
