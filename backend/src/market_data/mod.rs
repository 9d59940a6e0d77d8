pub mod loader;
pub mod series;

// Re-export the core types for convenient access (e.g. `use crate::market_data::OhlcvSeries`).
pub use loader::{load_all_historical_data, parse_datetime, LoadReport};
pub use series::{align, Bar, Column, OhlcvSeries};
