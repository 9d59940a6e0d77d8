// =============================================================================
// Dashboard Application State
// =============================================================================
//
// Immutable snapshot of everything in the output directory, swapped wholesale
// on reload. Request handlers clone the `Arc` under a short read lock and
// never hold the lock across an await.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock around the current snapshot.
// =============================================================================

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::correlation::{CorrelationEntry, MergedRow};
use crate::market_data::OhlcvSeries;
use crate::sentiment::KeywordReport;
use crate::store;
use crate::types::TickerMap;

/// All derived tables as last read from disk. Any of them may be empty.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub prices: TickerMap<OhlcvSeries>,
    pub merged: TickerMap<Vec<MergedRow>>,
    pub summary: Vec<CorrelationEntry>,
    pub keywords: Option<KeywordReport>,
    pub loaded_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Read every table from `dir`. Missing or unreadable tables are logged
    /// and left empty.
    pub fn load(dir: &Path) -> Self {
        let prices = store::load_processed_dir(dir).unwrap_or_else(|e| {
            warn!(dir = %dir.display(), error = %e, "failed to scan processed series");
            TickerMap::new()
        });
        let merged = store::load_merged_dir(dir).unwrap_or_else(|e| {
            warn!(dir = %dir.display(), error = %e, "failed to scan merged tables");
            TickerMap::new()
        });
        let summary = store::load_summary(dir).unwrap_or_else(|e| {
            warn!(error = %e, "correlation summary unavailable");
            Vec::new()
        });
        let keywords = store::load_keywords(dir)
            .map_err(|e| warn!(error = %e, "keyword report unavailable"))
            .ok();

        Self {
            prices,
            merged,
            summary,
            keywords,
            loaded_at: Utc::now(),
        }
    }

    /// Resolve a ticker case-insensitively against the loaded price tables
    /// and merged tables.
    pub fn resolve_ticker(&self, ticker: &str) -> Option<String> {
        self.prices
            .keys()
            .chain(self.merged.keys())
            .find(|t| t.eq_ignore_ascii_case(ticker))
            .cloned()
    }
}

/// Shared across all handlers via `Arc<AppState>`.
pub struct AppState {
    pub output_dir: PathBuf,
    /// Incremented on every reload.
    pub state_version: AtomicU64,
    snapshot: RwLock<Arc<DashboardSnapshot>>,
}

impl AppState {
    /// Build state and perform the initial load from `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let snapshot = DashboardSnapshot::load(&output_dir);
        info!(
            dir = %output_dir.display(),
            tickers = snapshot.prices.len(),
            correlations = snapshot.summary.len(),
            "dashboard data loaded"
        );
        Self {
            output_dir,
            state_version: AtomicU64::new(1),
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::Relaxed)
    }

    /// Re-read the output directory and swap in the new snapshot. Returns the
    /// new state version.
    pub fn reload(&self) -> u64 {
        let fresh = Arc::new(DashboardSnapshot::load(&self.output_dir));
        let tickers = fresh.prices.len();
        *self.snapshot.write() = fresh;
        let version = self.state_version.fetch_add(1, Ordering::Relaxed) + 1;
        info!(version, tickers, "dashboard data reloaded");
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::MergedRow;
    use chrono::NaiveDate;

    #[test]
    fn empty_dir_gives_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path());
        let snap = state.snapshot();
        assert!(snap.prices.is_empty());
        assert!(snap.summary.is_empty());
        assert!(snap.keywords.is_none());
        assert_eq!(state.current_state_version(), 1);
    }

    #[test]
    fn reload_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path());
        let before = state.snapshot();

        let rows = vec![MergedRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            daily_avg_sentiment: 0.2,
            daily_return: 0.01,
        }];
        store::save_merged(dir.path(), "NVDA", &rows).unwrap();

        assert_eq!(state.reload(), 2);
        let after = state.snapshot();
        assert!(before.merged.is_empty());
        assert_eq!(after.merged["NVDA"], rows);
        assert_eq!(after.resolve_ticker("nvda"), Some("NVDA".to_string()));
        assert_eq!(after.resolve_ticker("AMZN"), None);
    }
}
