use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use papertrade_core::quotes::{
    Granularity, HistoricalPrice, MarketDataError, MarketStatus, Quote, QuoteGateway, StockSplit,
};
use papertrade_core::settings::EngineSettings;
use papertrade_server::{api::app_router, build_state_with_gateway, config::Config};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

/// A market that is closed and quotes nothing.
struct ClosedMarket;

#[async_trait]
impl QuoteGateway for ClosedMarket {
    fn id(&self) -> &'static str {
        "CLOSED"
    }

    async fn get_quotes(&self, _symbols: &[String]) -> Result<Vec<Quote>, MarketDataError> {
        Ok(Vec::new())
    }

    async fn get_historical_prices(
        &self,
        _symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
        _granularity: Granularity,
    ) -> Result<Vec<HistoricalPrice>, MarketDataError> {
        Ok(Vec::new())
    }

    async fn get_stock_splits(
        &self,
        _for_date: NaiveDate,
    ) -> Result<Vec<StockSplit>, MarketDataError> {
        Ok(Vec::new())
    }

    async fn get_market_status(&self) -> Result<MarketStatus, MarketDataError> {
        Ok(MarketStatus {
            is_open: false,
            holidays: Vec::new(),
        })
    }
}

async fn build_test_router() -> (Router, TempDir) {
    let tmp = tempdir().unwrap();
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("test.db").to_string_lossy().into_owned(),
        quote_api_url: "http://127.0.0.1:9".to_string(),
        quote_api_key: None,
        request_timeout: Duration::from_secs(1),
        quote_requests_per_minute: 60,
        job_timeout: Duration::from_secs(30),
        engine: EngineSettings {
            historical_batch_delay_secs: 0,
            ..EngineSettings::default()
        },
    };
    let state = build_state_with_gateway(&config, Arc::new(ClosedMarket))
        .await
        .unwrap();
    (app_router(state, &config), tmp)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _tmp) = build_test_router().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_user_has_no_portfolio() {
    let (app, _tmp) = build_test_router().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/users/ghost/portfolio", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost"));

    let (status, body) = send(&app, Method::GET, "/api/v1/users/ghost/portfolio/growth", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn register_then_read_portfolio() {
    let (app, _tmp) = build_test_router().await;
    let register = serde_json::json!({ "userId": "u1", "startingCash": 5000 });

    let (status, body) = send(&app, Method::POST, "/api/v1/users", Some(register.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["portfolioState"]["cashOnHand"].as_f64(), Some(5000.0));

    let (status, _) = send(&app, Method::POST, "/api/v1/users", Some(register)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, "/api/v1/users/u1/portfolio", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["portfolioState"]["balance"].as_f64(), Some(5000.0));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/u1/portfolio/recalculate",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["portfolioState"]["startingCash"].as_f64(), Some(5000.0));
}

#[tokio::test]
async fn register_rejects_non_positive_cash() {
    let (app, _tmp) = build_test_router().await;
    let register = serde_json::json!({ "userId": "u1", "startingCash": 0 });

    let (status, _) = send(&app, Method::POST, "/api/v1/users", Some(register)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn jobs_report_per_run() {
    let (app, _tmp) = build_test_router().await;
    let register = serde_json::json!({ "userId": "u1" });
    send(&app, Method::POST, "/api/v1/users", Some(register)).await;

    let (status, body) = send(&app, Method::POST, "/api/v1/jobs/execute-orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marketOpen"], false);
    assert_eq!(body["filledOrders"], 0);

    let uri = "/api/v1/jobs/nightly-update?date=2024-03-07";
    let (status, body) = send(&app, Method::POST, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], serde_json::json!(["u1"]));

    let (status, body) = send(&app, Method::POST, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], serde_json::json!([]));
}
