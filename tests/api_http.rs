// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use axum::body::{self, Body};
use http::{Request, StatusCode};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use t2d_pulse::api::{router, AppState};
use t2d_pulse::config::AppConfig;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Router over a small deterministic three-sector universe.
fn test_router() -> axum::Router {
    let mut cfg = AppConfig::default();
    cfg.sectors = vec![
        "AdTech".into(),
        "Cloud Infrastructure".into(),
        "Fintech".into(),
    ];
    cfg.default_weights = [
        ("AdTech", 50.0),
        ("Cloud Infrastructure", 30.0),
        ("Fintech", 20.0),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), *v))
    .collect();
    let state = AppState::from_config(&cfg).expect("build test state");
    router(state)
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

async fn post(app: axum::Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_pulse_is_neutral_before_first_feed() {
    let app = test_router();
    let (status, v) = get(app, "/pulse").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["pulse"], 50.0);
    assert_eq!(v["mood"], "Neutral");
    assert!(v["weights"].is_object());
}

#[tokio::test]
async fn api_sectors_lists_the_catalog() {
    let app = test_router();
    let (status, v) = get(app, "/sectors").await;
    assert_eq!(status, StatusCode::OK);
    let sectors = v["sectors"].as_array().expect("sectors array");
    assert_eq!(sectors.len(), 3);
}

#[tokio::test]
async fn api_weights_report_total_and_floor() {
    let app = test_router();
    let (status, v) = get(app, "/weights").await;
    assert_eq!(status, StatusCode::OK);
    let total = v["total"].as_f64().expect("total");
    assert!((total - 100.0).abs() <= 0.01);
    assert_eq!(v["floor"], 1.0);
}

#[tokio::test]
async fn api_feed_then_pulse_reflects_scores() {
    let app = test_router();

    let (status, v) = post(
        app.clone(),
        "/feed/scores",
        json!({ "scores": { "AdTech": 80.0, "Cloud Infrastructure": 80.0, "Fintech": 80.0 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["pulse"], 80.0);
    assert_eq!(v["mood"], "Bullish");

    let (_, v) = get(app, "/pulse").await;
    assert_eq!(v["pulse"], 80.0);
}

#[tokio::test]
async fn api_weight_edit_renormalizes_and_answers_full_view() {
    let app = test_router();

    let (status, v) = post(
        app,
        "/weights/apply",
        json!({ "sector": "AdTech", "value": 70.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["weights"]["AdTech"], 70.0);
    assert_eq!(v["weights"]["Cloud Infrastructure"], 18.0);
    assert_eq!(v["weights"]["Fintech"], 12.0);
    assert!(v.get("pulse").is_some(), "mutation must answer the full view");
}

#[tokio::test]
async fn api_alias_spellings_resolve_on_edit() {
    let app = test_router();
    // "FinTech" is a spelling variant of the canonical "Fintech".
    let (status, v) = post(
        app,
        "/weights/apply",
        json!({ "sector": "FinTech", "value": 40.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["weights"]["Fintech"], 40.0);
}

#[tokio::test]
async fn api_unknown_sector_yields_400_with_json_error() {
    let app = test_router();

    let (status, v) = post(
        app.clone(),
        "/weights/apply",
        json!({ "sector": "Underwater Basket Weaving", "value": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "unknown_sector");
    assert!(v["message"].as_str().unwrap().contains("Underwater"));

    // The rejected edit must not have touched the weights.
    let (_, w) = get(app, "/weights").await;
    assert_eq!(w["weights"]["AdTech"], 50.0);
}

#[tokio::test]
async fn api_typo_gets_a_suggestion() {
    let app = test_router();
    let (status, v) = post(
        app,
        "/weights/apply",
        json!({ "sector": "Fintch", "value": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["suggestion"], "Fintech");
}

#[tokio::test]
async fn api_reset_restores_equal_weights() {
    let app = test_router();

    post(
        app.clone(),
        "/weights/apply",
        json!({ "sector": "AdTech", "value": 90.0 }),
    )
    .await;
    let (status, v) = post(app, "/weights/reset", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    for w in v["weights"].as_object().unwrap().values() {
        assert!((w.as_f64().unwrap() - 100.0 / 3.0).abs() < 1e-9);
    }
}

#[tokio::test]
async fn api_market_caps_become_weights() {
    let app = test_router();
    let (status, v) = post(
        app,
        "/weights/marketcap",
        json!({ "caps": { "AdTech": 1.0e12, "Cloud Infrastructure": 2.0e12, "Fintech": 1.0e12 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["weights"]["Cloud Infrastructure"], 50.0);
    assert_eq!(v["weights"]["AdTech"], 25.0);
}

#[tokio::test]
async fn api_macro_feed_scores_all_sectors() {
    let app = test_router();
    let (status, v) = post(
        app,
        "/feed/macros",
        json!({ "indicators": { "VIX": 10.0, "CPI_YoY_%": 2.0 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Everything favourable: all sector scores 100, pulse 100.
    assert_eq!(v["pulse"], 100.0);
    assert_eq!(v["scores"]["Fintech"], 100.0);
}

#[tokio::test]
async fn api_debug_routes_expose_history_and_rolling() {
    let app = test_router();

    post(
        app.clone(),
        "/feed/scores",
        json!({ "scores": { "AdTech": 60.0, "Cloud Infrastructure": 60.0, "Fintech": 60.0 } }),
    )
    .await;

    let (status, v) = get(app.clone(), "/debug/history?n=5").await;
    assert_eq!(status, StatusCode::OK);
    let rows = v.as_array().expect("history array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["pulse"], 60.0);

    let (status, v) = get(app, "/debug/rolling").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["count"], 1);
    assert_eq!(v["average"], 60.0);
}
