use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Source column names every OHLCV input is expected to carry.
pub const DATE_COL: &str = "Date";
pub const OPEN_COL: &str = "Open";
pub const HIGH_COL: &str = "High";
pub const LOW_COL: &str = "Low";
pub const CLOSE_COL: &str = "Close";
pub const VOLUME_COL: &str = "Volume";

/// Columns without which no indicator or metric can be computed.
pub const OHLCV_COLUMNS: [&str; 5] = [OPEN_COL, HIGH_COL, LOW_COL, CLOSE_COL, VOLUME_COL];

/// A single daily OHLCV bar. Price fields are always finite after loading;
/// volume may be missing in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// A derived numeric column. `NaN` marks warm-up or otherwise undefined
/// entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// OhlcvSeries
// ---------------------------------------------------------------------------

/// Date-ordered bars for one ticker plus any derived columns appended by the
/// indicator and metrics engines.
///
/// The bars themselves are never modified once loaded; augmentation always
/// produces a new series with extra columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvSeries {
    pub ticker: String,
    pub bars: Vec<Bar>,
    /// Source columns that were absent from the input file.
    #[serde(default)]
    pub missing_columns: Vec<String>,
    /// Derived columns in the order they were added.
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl OhlcvSeries {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
            missing_columns: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Volumes with missing entries mapped to `NaN`.
    pub fn volumes(&self) -> Vec<f64> {
        self.bars
            .iter()
            .map(|b| b.volume.unwrap_or(f64::NAN))
            .collect()
    }

    /// Look up a derived column by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Which of `required` source columns this series lacks.
    pub fn missing_of(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|col| self.missing_columns.iter().any(|m| m == *col))
            .map(|col| col.to_string())
            .collect()
    }

    /// Return a copy of this series with `new_columns` appended. A derived
    /// column with the same name is replaced in place so re-running a stage
    /// is idempotent.
    pub fn with_columns(&self, new_columns: Vec<Column>) -> Self {
        let mut out = self.clone();
        for column in new_columns {
            debug_assert_eq!(column.values.len(), out.bars.len());
            match out.columns.iter_mut().find(|c| c.name == column.name) {
                Some(existing) => *existing = column,
                None => out.columns.push(column),
            }
        }
        out
    }
}

/// Place a compact indicator output (which starts at its first defined index)
/// into a `NaN`-filled vector of length `len`, beginning at `start`.
///
/// Values that would run past `len` are dropped; positions after a truncated
/// output stay `NaN`.
pub fn align(compact: Vec<f64>, start: usize, len: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; len];
    for (slot, v) in out.iter_mut().skip(start).zip(compact) {
        *slot = v;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: None,
        }
    }

    #[test]
    fn volumes_map_missing_to_nan() {
        let series = OhlcvSeries::new("AAPL", vec![bar(1, 10.0), bar(2, 11.0)]);
        assert!(series.volumes().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn with_columns_does_not_touch_original() {
        let series = OhlcvSeries::new("AAPL", vec![bar(1, 10.0), bar(2, 11.0)]);
        let augmented = series.with_columns(vec![Column::new("X", vec![1.0, 2.0])]);
        assert!(series.columns.is_empty());
        assert_eq!(augmented.column("X"), Some(&[1.0, 2.0][..]));
        assert_eq!(augmented.bars, series.bars);
    }

    #[test]
    fn with_columns_replaces_same_name() {
        let series = OhlcvSeries::new("AAPL", vec![bar(1, 10.0)])
            .with_columns(vec![Column::new("X", vec![1.0])])
            .with_columns(vec![Column::new("X", vec![5.0])]);
        assert_eq!(series.columns.len(), 1);
        assert_eq!(series.column("X"), Some(&[5.0][..]));
    }

    #[test]
    fn align_places_at_offset() {
        let aligned = align(vec![1.0, 2.0], 2, 5);
        assert!(aligned[0].is_nan() && aligned[1].is_nan());
        assert_eq!(&aligned[2..4], &[1.0, 2.0]);
        assert!(aligned[4].is_nan());
        assert!(align(Vec::new(), 3, 3).iter().all(|v| v.is_nan()));
        assert_eq!(align(vec![1.0, 2.0, 3.0], 1, 2)[1], 1.0);
    }

    #[test]
    fn missing_of_reports_only_required() {
        let mut series = OhlcvSeries::new("AAPL", vec![bar(1, 10.0)]);
        series.missing_columns = vec![VOLUME_COL.to_string()];
        assert_eq!(series.missing_of(&OHLCV_COLUMNS), vec!["Volume".to_string()]);
        assert!(series.missing_of(&[CLOSE_COL]).is_empty());
    }
}
