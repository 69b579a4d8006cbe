//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and
//! exercise the /api/v1/* endpoints using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use sentra::api::{create_app, DashboardState};
use sentra::auth::StaticSessionProvider;
use sentra::insight::InsightClient;
use sentra::playback::PlaybackDriver;
use sentra::store::{MemoryKv, ReportStore};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

const TOKEN: &str = "test-session";

const SCENARIO_CSV: &str = "Timestamp,Current\n00:00,40.0\n00:01,38.0\n00:02,36.0\n";

fn create_test_state() -> DashboardState {
    DashboardState {
        reports: Arc::new(ReportStore::load(Arc::new(MemoryKv::new()))),
        playback: Arc::new(RwLock::new(PlaybackDriver::new())),
        sessions: Arc::new(StaticSessionProvider::new([TOKEN])),
        insight: Arc::new(InsightClient::new("http://localhost:0/generate", None)),
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap()
}

fn post_csv(uri: &str, csv: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", TOKEN))
        .body(Body::from(csv.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All session-gated GET endpoints return 200 with a valid token.
#[tokio::test]
async fn test_get_endpoints_return_200() {
    let endpoints = [
        "/api/v1/health",
        "/api/v1/reports/Temperature",
        "/api/v1/reports/Pressure",
        "/api/v1/live",
    ];

    for endpoint in &endpoints {
        let app = create_app(create_test_state());
        let resp = app.oneshot(get(endpoint)).await.unwrap();
        assert!(
            resp.status().is_success(),
            "GET {endpoint} returned status {}",
            resp.status()
        );
    }
}

/// Gated endpoints reject requests without a session; health stays open.
#[tokio::test]
async fn test_missing_session_is_unauthorized() {
    let gated = ["/api/v1/reports/Temperature", "/api/v1/live"];
    for endpoint in &gated {
        let app = create_app(create_test_state());
        let resp = app
            .oneshot(Request::builder().uri(*endpoint).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "GET {endpoint}");
    }

    let app = create_app(create_test_state());
    let resp = app
        .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

/// An unknown bearer token is rejected like a missing one.
#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/live")
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

/// Upload → list → delete, end to end over the HTTP surface.
#[tokio::test]
async fn test_upload_list_delete_flow() {
    let state = create_test_state();

    // Upload.
    let resp = create_app(state.clone())
        .oneshot(post_csv(
            "/api/v1/reports/Temperature?filename=cooldown.csv",
            SCENARIO_CSV,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["duplicate"], false);
    assert_eq!(json["data"]["stats"]["min"], 36.0);
    assert_eq!(json["data"]["stats"]["max"], 40.0);
    assert_eq!(json["data"]["stats"]["average"], 38.0);
    let id = json["data"]["report"]["id"].as_u64().unwrap();

    // The playback driver picked the series up.
    let resp = create_app(state.clone()).oneshot(get("/api/v1/live")).await.unwrap();
    let live = body_json(resp).await;
    assert_eq!(live["data"]["currentValue"], 40.0);
    assert_eq!(live["data"]["dataPoints"], 3);
    assert_eq!(live["data"]["phase"], "playing");

    // List shows one report.
    let resp = create_app(state.clone())
        .oneshot(get("/api/v1/reports/Temperature"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["reports"][0]["fileName"], "cooldown.csv");

    // Delete it.
    let resp = create_app(state.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/reports/Temperature/{}", id))
                .header("authorization", format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["removed"], true);

    let resp = create_app(state)
        .oneshot(get("/api/v1/reports/Temperature"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["count"], 0);
}

/// The same file uploaded twice stores a single report.
#[tokio::test]
async fn test_duplicate_upload_is_not_stored_twice() {
    let state = create_test_state();

    for expected_duplicate in [false, true] {
        let resp = create_app(state.clone())
            .oneshot(post_csv(
                "/api/v1/reports/Temperature?filename=same.csv",
                SCENARIO_CSV,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["duplicate"], expected_duplicate);
    }

    let resp = create_app(state)
        .oneshot(get("/api/v1/reports/Temperature"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["count"], 1);
}

/// Deleting an id that does not exist is a 200 no-op.
#[tokio::test]
async fn test_delete_unknown_id_is_a_no_op() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/reports/Temperature/424242")
                .header("authorization", format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["removed"], false);
}

/// Unsupported extensions are rejected before parsing, with no state change.
#[tokio::test]
async fn test_unsupported_extension_is_bad_request() {
    let state = create_test_state();
    let resp = create_app(state.clone())
        .oneshot(post_csv(
            "/api/v1/reports/Temperature?filename=readings.pdf",
            SCENARIO_CSV,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = create_app(state)
        .oneshot(get("/api/v1/reports/Temperature"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["count"], 0);
}

/// Unknown parameter segments are rejected.
#[tokio::test]
async fn test_unknown_parameter_is_bad_request() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/api/v1/reports/Voltage")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

/// Preview parses without mutating the store.
#[tokio::test]
async fn test_preview_does_not_store() {
    let state = create_test_state();
    let resp = create_app(state.clone())
        .oneshot(post_csv("/api/v1/upload/preview?filename=peek.csv", SCENARIO_CSV))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["preview"]["dataPoints"], 3);
    assert_eq!(json["data"]["preview"]["timeRange"], "00:00 - 00:02");

    let resp = create_app(state)
        .oneshot(get("/api/v1/reports/Temperature"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["count"], 0);
}

/// Threshold override is applied to the live snapshot.
#[tokio::test]
async fn test_threshold_override() {
    let state = create_test_state();
    create_app(state.clone())
        .oneshot(post_csv(
            "/api/v1/reports/Temperature?filename=t.csv",
            SCENARIO_CSV,
        ))
        .await
        .unwrap();

    let resp = create_app(state.clone())
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/threshold")
                .header("authorization", format!("Bearer {}", TOKEN))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"threshold": 37.5}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = create_app(state).oneshot(get("/api/v1/live")).await.unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["data"]["threshold"], 37.5);
}

/// Insights with no upstream key return the structured fallback payload.
#[tokio::test]
async fn test_insights_unconfigured_fallback() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/insights")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"temperatureData": {"current": [40.0, 38.0]}}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["error"].is_string());
    assert!(!json["insights"].as_array().unwrap().is_empty());
}

/// Insights with an empty series short-circuit before any upstream call.
#[tokio::test]
async fn test_insights_empty_input() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/insights")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"temperatureData": {"current": []}}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
