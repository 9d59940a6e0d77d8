// =============================================================================
// Polarity Scoring
// =============================================================================
//
// Rule-based financial lexicon. A text's polarity is the mean score of the
// lexicon terms it contains, with negation flipping and intensifiers scaling
// the next matched term. Result is clamped to [-1, 1].
//
// Input is expected to be normalised headline text, so negations and
// intensifiers that are also stop-words are not listed.
// =============================================================================

use std::collections::HashMap;
use std::sync::LazyLock;

/// Maps text to a polarity in [-1, 1].
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

static TERMS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    [
        // Positive
        ("bullish", 0.8),
        ("surge", 0.7),
        ("surged", 0.7),
        ("soar", 0.8),
        ("soared", 0.8),
        ("rally", 0.7),
        ("rallied", 0.7),
        ("jump", 0.6),
        ("jumped", 0.6),
        ("gain", 0.5),
        ("gained", 0.5),
        ("rise", 0.5),
        ("rose", 0.5),
        ("climb", 0.5),
        ("boost", 0.5),
        ("boosted", 0.5),
        ("profit", 0.6),
        ("profitable", 0.6),
        ("growth", 0.6),
        ("grow", 0.4),
        ("increase", 0.4),
        ("improve", 0.5),
        ("improved", 0.5),
        ("outperform", 0.7),
        ("beat", 0.6),
        ("exceed", 0.6),
        ("strong", 0.5),
        ("positive", 0.5),
        ("optimistic", 0.6),
        ("confident", 0.5),
        ("record", 0.5),
        ("upgrade", 0.6),
        ("upgraded", 0.6),
        ("buy", 0.5),
        ("breakthrough", 0.7),
        ("breakout", 0.6),
        ("recovery", 0.5),
        ("rebound", 0.5),
        ("win", 0.5),
        ("success", 0.6),
        ("successful", 0.6),
        ("top", 0.3),
        ("best", 0.6),
        ("good", 0.5),
        ("great", 0.7),
        ("higher", 0.4),
        ("launch", 0.2),
        ("dividend", 0.3),
        ("innovation", 0.4),
        // Negative
        ("bearish", -0.8),
        ("crash", -0.9),
        ("crashed", -0.9),
        ("plunge", -0.8),
        ("plunged", -0.8),
        ("tumble", -0.7),
        ("slump", -0.7),
        ("drop", -0.6),
        ("dropped", -0.6),
        ("fall", -0.5),
        ("fell", -0.5),
        ("decline", -0.6),
        ("declined", -0.6),
        ("loss", -0.6),
        ("lose", -0.5),
        ("lower", -0.4),
        ("decrease", -0.5),
        ("weak", -0.5),
        ("negative", -0.5),
        ("pessimistic", -0.6),
        ("concern", -0.5),
        ("worry", -0.5),
        ("fear", -0.6),
        ("risk", -0.4),
        ("volatile", -0.3),
        ("uncertainty", -0.5),
        ("miss", -0.6),
        ("missed", -0.6),
        ("disappoint", -0.7),
        ("disappointing", -0.7),
        ("underperform", -0.6),
        ("downgrade", -0.6),
        ("downgraded", -0.6),
        ("sell", -0.5),
        ("selloff", -0.7),
        ("recall", -0.5),
        ("probe", -0.5),
        ("lawsuit", -0.6),
        ("antitrust", -0.4),
        ("investigation", -0.5),
        ("layoff", -0.6),
        ("cut", -0.4),
        ("crisis", -0.8),
        ("warning", -0.5),
        ("trouble", -0.6),
        ("problem", -0.5),
        ("fail", -0.7),
        ("failed", -0.7),
        ("fraud", -0.9),
        ("bankruptcy", -0.9),
        ("default", -0.7),
        ("bad", -0.6),
        ("worst", -0.8),
    ]
    .into_iter()
    .collect()
});

static NEGATIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    vec![
        "never", "neither", "nobody", "nothing", "none", "cannot", "cant",
        "dont", "doesnt", "didnt", "wont", "isnt", "arent", "wasnt", "hardly", "barely",
        "without",
    ]
});

static INTENSIFIERS: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    [
        ("extremely", 2.0),
        ("highly", 1.5),
        ("significantly", 1.5),
        ("sharply", 1.6),
        ("dramatically", 1.8),
        ("massive", 1.5),
        ("huge", 1.5),
        ("slightly", 0.5),
        ("somewhat", 0.7),
        ("modest", 0.6),
        ("marginally", 0.5),
    ]
    .into_iter()
    .collect()
});

/// Lexicon score of a single lowercase term, if known.
pub fn term_score(word: &str) -> Option<f64> {
    TERMS.get(word).copied()
}

/// Default scorer backed by the built-in financial lexicon.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let mut total = 0.0;
        let mut hits = 0usize;
        let mut negate_next = false;
        let mut intensity = 1.0;

        for word in text.split_whitespace() {
            let word = word.to_lowercase();

            if NEGATIONS.contains(&word.as_str()) {
                negate_next = true;
                continue;
            }
            if let Some(mult) = INTENSIFIERS.get(word.as_str()) {
                intensity = *mult;
                continue;
            }

            if let Some(score) = term_score(&word) {
                let signed = if negate_next { -score } else { score };
                total += signed * intensity;
                hits += 1;
            }
            negate_next = false;
            intensity = 1.0;
        }

        if hits == 0 {
            0.0
        } else {
            (total / hits as f64).clamp(-1.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicon_signs() {
        assert!(term_score("bullish").unwrap() > 0.0);
        assert!(term_score("plunge").unwrap() < 0.0);
        assert!(term_score("apple").is_none());
    }

    #[test]
    fn empty_or_unknown_is_neutral() {
        assert_eq!(LexiconScorer.polarity(""), 0.0);
        assert_eq!(LexiconScorer.polarity("apple vision pro"), 0.0);
    }

    #[test]
    fn positive_and_negative_headlines() {
        assert!(LexiconScorer.polarity("apple strong earnings boost stock") > 0.0);
        assert!(LexiconScorer.polarity("tesla recall vehicle share fall") < 0.0);
    }

    #[test]
    fn negation_flips_next_term() {
        let plain = LexiconScorer.polarity("outlook strong");
        let negated = LexiconScorer.polarity("outlook hardly strong");
        assert!(plain > 0.0);
        assert!((negated + plain).abs() < 1e-12);
    }

    #[test]
    fn modifiers_survive_normalisation() {
        use crate::sentiment::preprocess::preprocess_text;

        let plain = LexiconScorer.polarity(&preprocess_text("Outlook is strong"));
        let negated = LexiconScorer.polarity(&preprocess_text("Outlook isn't strong"));
        let boosted = LexiconScorer.polarity(&preprocess_text("Shares rally sharply"));
        assert!(plain > 0.0);
        assert!((negated + plain).abs() < 1e-12);
        assert!(LexiconScorer.polarity(&preprocess_text("Shares sharply rally")) > boosted);

        // Stop-word modifiers are gone before scoring.
        for word in ["not", "no", "very"] {
            assert!(!NEGATIONS.contains(&word) && !INTENSIFIERS.contains_key(word));
            assert_eq!(preprocess_text(word), "");
        }
    }

    #[test]
    fn intensifier_scales_and_result_is_clamped() {
        let normal = LexiconScorer.polarity("shares rally");
        let intense = LexiconScorer.polarity("shares extremely rally");
        assert!(intense > normal);
        assert_eq!(LexiconScorer.polarity("extremely crash"), -1.0);
    }
}
