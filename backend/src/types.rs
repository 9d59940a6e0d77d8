// =============================================================================
// Shared types used across the sentiment pipeline
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-ticker keyed container. Iterates in sorted ticker order so output files
/// and logs are deterministic.
pub type TickerMap<T> = BTreeMap<String, T>;

/// Why an augmentation stage left a series untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// One or more required source columns were absent from the input file.
    MissingColumns(Vec<String>),
    /// The series has no rows at all.
    Empty,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumns(cols) => write!(f, "missing columns: {}", cols.join(", ")),
            Self::Empty => write!(f, "empty series"),
        }
    }
}

/// Result of running one augmentation stage over a series.
///
/// A skipped stage still hands back the series (unmodified) so the batch can
/// carry on with the next stage or ticker.
#[derive(Debug, Clone)]
pub enum StageOutcome<T> {
    Applied(T),
    Skipped { data: T, reason: SkipReason },
}

impl<T> StageOutcome<T> {
    /// Unwrap the carried data regardless of outcome.
    pub fn into_inner(self) -> T {
        match self {
            Self::Applied(data) => data,
            Self::Skipped { data, .. } => data,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Applied(_) => None,
            Self::Skipped { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_into_inner_returns_data_both_ways() {
        let applied: StageOutcome<u32> = StageOutcome::Applied(7);
        assert!(applied.skip_reason().is_none());
        assert_eq!(applied.into_inner(), 7);

        let skipped = StageOutcome::Skipped {
            data: 3,
            reason: SkipReason::MissingColumns(vec!["Volume".into()]),
        };
        assert!(skipped.skip_reason().is_some());
        assert_eq!(
            skipped.skip_reason().map(|r| r.to_string()),
            Some("missing columns: Volume".to_string())
        );
        assert_eq!(skipped.into_inner(), 3);
    }
}
