// =============================================================================
// Pipeline Error Types
// =============================================================================
//
// Every variant is scoped to a single ticker, file, or derived column. The
// batch runner logs them and moves on; none of them abort the whole run.
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("missing column '{column}' for {ticker}")]
    MissingColumn { ticker: String, column: String },

    #[error("malformed row {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("only {pairs} overlapping sentiment/return pairs for {ticker} (need 2)")]
    InsufficientOverlap { ticker: String, pairs: usize },

    #[error("correlation undefined for {ticker}: zero variance")]
    UndefinedCorrelation { ticker: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
