// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// Read-only JSON data service for the dashboard. All endpoints live under
// `/api/v1/`. A ticker or table that has not been produced yet is not an
// error: the response is 200 with `"status": "no_data"` and empty `rows`.
//
// CORS is configured permissively; the front-end is served from elsewhere.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::app_state::AppState;
use crate::correlation::{correlate, CorrelationEntry, MergedRow};
use crate::market_data::series::{
    CLOSE_COL, DATE_COL, HIGH_COL, LOW_COL, OPEN_COL, VOLUME_COL,
};
use crate::market_data::OhlcvSeries;

const STATUS_OK: &str = "ok";
const STATUS_NO_DATA: &str = "no_data";

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/tickers", get(tickers))
        .route("/api/v1/tickers/:ticker/prices", get(prices))
        .route("/api/v1/tickers/:ticker/sentiment", get(sentiment))
        .route("/api/v1/correlations", get(correlations))
        .route("/api/v1/keywords", get(keywords))
        .route("/api/v1/reload", post(reload))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    loaded_at: String,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    Json(HealthResponse {
        status: STATUS_OK,
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        loaded_at: snapshot.loaded_at.to_rfc3339(),
    })
}

// =============================================================================
// Tickers
// =============================================================================

#[derive(Serialize)]
struct TickersResponse {
    tickers: Vec<String>,
}

async fn tickers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    Json(TickersResponse {
        tickers: snapshot.prices.keys().cloned().collect(),
    })
}

// =============================================================================
// Augmented price series
// =============================================================================

#[derive(Serialize)]
struct PricesResponse {
    status: &'static str,
    ticker: String,
    columns: Vec<String>,
    rows: Vec<Map<String, Value>>,
}

/// Row-oriented view of a series. Undefined values serialise as `null`.
fn series_rows(series: &OhlcvSeries) -> (Vec<String>, Vec<Map<String, Value>>) {
    let mut columns: Vec<String> = [DATE_COL, OPEN_COL, HIGH_COL, LOW_COL, CLOSE_COL, VOLUME_COL]
        .iter()
        .map(|c| c.to_string())
        .collect();
    columns.extend(series.column_names().into_iter().map(str::to_string));

    let rows = series
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let mut row = Map::new();
            row.insert(DATE_COL.into(), Value::from(bar.date.to_string()));
            row.insert(OPEN_COL.into(), Value::from(bar.open));
            row.insert(HIGH_COL.into(), Value::from(bar.high));
            row.insert(LOW_COL.into(), Value::from(bar.low));
            row.insert(CLOSE_COL.into(), Value::from(bar.close));
            row.insert(
                VOLUME_COL.into(),
                bar.volume.map(Value::from).unwrap_or(Value::Null),
            );
            for c in &series.columns {
                // `Value::from` maps non-finite floats to null.
                row.insert(c.name.clone(), Value::from(c.values[i]));
            }
            row
        })
        .collect();
    (columns, rows)
}

async fn prices(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> impl IntoResponse {
    let snapshot = state.snapshot();
    let series = snapshot
        .resolve_ticker(&ticker)
        .and_then(|t| snapshot.prices.get(&t));

    let Some(series) = series else {
        debug!(ticker = %ticker, "no processed series");
        return Json(PricesResponse {
            status: STATUS_NO_DATA,
            ticker,
            columns: Vec::new(),
            rows: Vec::new(),
        });
    };

    let (columns, rows) = series_rows(series);
    Json(PricesResponse {
        status: STATUS_OK,
        ticker: series.ticker.clone(),
        columns,
        rows,
    })
}

// =============================================================================
// Sentiment vs. return
// =============================================================================

#[derive(Serialize)]
struct SentimentResponse {
    status: &'static str,
    ticker: String,
    correlation: Option<f64>,
    /// Why `correlation` is null, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    rows: Vec<MergedRow>,
}

async fn sentiment(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> impl IntoResponse {
    let snapshot = state.snapshot();
    let resolved = snapshot.resolve_ticker(&ticker);
    let rows = resolved.as_ref().and_then(|t| snapshot.merged.get(t));

    let Some(rows) = rows.filter(|r| !r.is_empty()) else {
        return Json(SentimentResponse {
            status: STATUS_NO_DATA,
            ticker,
            correlation: None,
            note: None,
            rows: Vec::new(),
        });
    };

    let ticker = resolved.unwrap_or(ticker);
    let (correlation, note) = match correlate(&ticker, rows) {
        Ok(r) => (Some(r), None),
        Err(e) => (None, Some(e.to_string())),
    };
    Json(SentimentResponse {
        status: STATUS_OK,
        ticker,
        correlation,
        note,
        rows: rows.clone(),
    })
}

// =============================================================================
// Correlation summary / keywords
// =============================================================================

#[derive(Serialize)]
struct RowsResponse<T: Serialize> {
    status: &'static str,
    rows: Vec<T>,
}

fn rows_response<T: Serialize>(rows: Vec<T>) -> Json<RowsResponse<T>> {
    let status = if rows.is_empty() {
        STATUS_NO_DATA
    } else {
        STATUS_OK
    };
    Json(RowsResponse { status, rows })
}

async fn correlations(State(state): State<Arc<AppState>>) -> Json<RowsResponse<CorrelationEntry>> {
    rows_response(state.snapshot().summary.clone())
}

#[derive(Serialize)]
struct KeywordsResponse {
    status: &'static str,
    unigrams: Vec<(String, usize)>,
    bigrams: Vec<(String, usize)>,
}

async fn keywords(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    let resp = match &snapshot.keywords {
        Some(report) => KeywordsResponse {
            status: STATUS_OK,
            unigrams: report.unigrams.clone(),
            bigrams: report.bigrams.clone(),
        },
        None => KeywordsResponse {
            status: STATUS_NO_DATA,
            unigrams: Vec::new(),
            bigrams: Vec::new(),
        },
    };
    Json(resp)
}

// =============================================================================
// Reload
// =============================================================================

async fn reload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let worker = state.clone();
    match tokio::task::spawn_blocking(move || worker.reload()).await {
        Ok(version) => {
            let snapshot = state.snapshot();
            let body = serde_json::json!({
                "status": STATUS_OK,
                "state_version": version,
                "tickers": snapshot.prices.keys().collect::<Vec<_>>(),
            });
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            warn!(error = %e, "reload task failed");
            let body = serde_json::json!({ "status": "error", "message": e.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{Days, NaiveDate};
    use tower::ServiceExt;

    use crate::indicators::{add_all_common_indicators, IndicatorParams};
    use crate::market_data::Bar;
    use crate::store;

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn seed(dir: &std::path::Path) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<Bar> = (0..30)
            .map(|i| {
                let c = 20.0 + i as f64 * 0.5;
                Bar {
                    date: start + Days::new(i),
                    open: c - 0.2,
                    high: c + 0.5,
                    low: c - 0.5,
                    close: c,
                    volume: Some(100.0),
                }
            })
            .collect();
        let series = add_all_common_indicators(&OhlcvSeries::new("AAPL", bars), &IndicatorParams::default())
            .into_inner();
        store::save_processed(dir, &series).unwrap();

        let merged: Vec<MergedRow> = [(1, 0.1, 0.01), (2, -0.2, -0.02), (3, 0.3, 0.025)]
            .iter()
            .map(|&(d, s, r)| MergedRow {
                date: start + Days::new(d),
                daily_avg_sentiment: s,
                daily_return: r,
            })
            .collect();
        store::save_merged(dir, "AAPL", &merged).unwrap();
        store::save_summary(
            dir,
            &[CorrelationEntry {
                ticker: "AAPL".into(),
                correlation: 0.99,
            }],
        )
        .unwrap();
    }

    #[tokio::test]
    async fn health_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Arc::new(AppState::new(dir.path())));
        let (status, body) = call(app, "GET", "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["state_version"], 1);
    }

    #[tokio::test]
    async fn empty_output_dir_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Arc::new(AppState::new(dir.path())));

        let (status, body) = call(app.clone(), "GET", "/api/v1/tickers/AAPL/prices").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_data");
        assert_eq!(body["rows"], serde_json::json!([]));

        let (_, body) = call(app.clone(), "GET", "/api/v1/tickers/AAPL/sentiment").await;
        assert_eq!(body["status"], "no_data");

        let (_, body) = call(app.clone(), "GET", "/api/v1/correlations").await;
        assert_eq!(body["status"], "no_data");

        let (_, body) = call(app, "GET", "/api/v1/keywords").await;
        assert_eq!(body["status"], "no_data");
    }

    #[tokio::test]
    async fn serves_seeded_tables() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path());
        let app = router(Arc::new(AppState::new(dir.path())));

        let (_, body) = call(app.clone(), "GET", "/api/v1/tickers").await;
        assert_eq!(body["tickers"], serde_json::json!(["AAPL"]));

        let (_, body) = call(app.clone(), "GET", "/api/v1/tickers/aapl/prices").await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["rows"].as_array().unwrap().len(), 30);
        assert!(body["rows"][0]["SMA_10"].is_null());
        assert!(body["rows"][29]["SMA_10"].is_number());
        assert_eq!(body["columns"][0], "Date");

        let (_, body) = call(app.clone(), "GET", "/api/v1/tickers/AAPL/sentiment").await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["rows"].as_array().unwrap().len(), 3);
        let r = body["correlation"].as_f64().unwrap();
        assert!((-1.0..=1.0).contains(&r));

        let (_, body) = call(app, "GET", "/api/v1/correlations").await;
        assert_eq!(body["rows"][0]["Ticker"], "AAPL");
    }

    #[tokio::test]
    async fn reload_bumps_version() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(Arc::new(AppState::new(dir.path())));
        seed(dir.path());

        let (status, body) = call(app.clone(), "POST", "/api/v1/reload").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state_version"], 2);
        assert_eq!(body["tickers"], serde_json::json!(["AAPL"]));

        let (_, body) = call(app, "GET", "/api/v1/tickers").await;
        assert_eq!(body["tickers"], serde_json::json!(["AAPL"]));
    }
}
