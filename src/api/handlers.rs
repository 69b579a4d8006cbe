//! HTTP handlers for the dashboard API.

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::auth::{SessionAuth, SessionProvider};
use crate::ingest::{self, IngestError};
use crate::insight::{InsightClient, InsightFailure, InsightReply, InsightRequest};
use crate::playback::PlaybackDriver;
use crate::stats::SeriesStats;
use crate::store::ReportStore;
use crate::types::{Parameter, Report};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct DashboardState {
    pub reports: Arc<ReportStore>,
    pub playback: Arc<RwLock<PlaybackDriver>>,
    pub sessions: Arc<dyn SessionProvider>,
    pub insight: Arc<InsightClient>,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
    /// Optional user-supplied report name; auto-generated when absent.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdBody {
    pub threshold: f64,
}

fn ingest_error_response(err: &IngestError) -> Response {
    // Both format and parse failures are user-correctable upload problems.
    ApiErrorResponse::bad_request(err.to_string())
}

fn parse_parameter(raw: &str) -> Result<Parameter, Response> {
    raw.parse::<Parameter>()
        .map_err(|e| ApiErrorResponse::bad_request(e.to_string()))
}

/// GET /api/v1/health — liveness, ungated.
pub async fn health() -> Response {
    ApiResponse::ok(serde_json::json!({
        "status": "ok",
        "service": "sentra",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/v1/upload/preview — parse only, no state change.
pub async fn upload_preview(
    State(_state): State<DashboardState>,
    _auth: SessionAuth,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Response {
    match ingest::ingest(&query.filename, &body) {
        Ok(parsed) => ApiResponse::ok(serde_json::json!({ "preview": parsed.preview })),
        Err(e) => ingest_error_response(&e),
    }
}

/// POST /api/v1/reports/{parameter} — parse, store, activate playback.
///
/// A fingerprint collision is not an error: the existing report is
/// returned with `duplicate: true` and nothing is written. Either way the
/// parsed series becomes the active temperature playback, matching the
/// dashboard's apply-upload behavior.
pub async fn create_report(
    State(state): State<DashboardState>,
    _auth: SessionAuth,
    Path(parameter): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Response {
    let parameter = match parse_parameter(&parameter) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let parsed = match ingest::ingest(&query.filename, &body) {
        Ok(parsed) => parsed,
        Err(e) => return ingest_error_response(&e),
    };

    let report = Report::new(parameter, &parsed.file_name, query.name.clone(), &parsed.series);
    let outcome = match state.reports.add(report) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "failed to persist report");
            return ApiErrorResponse::internal(e.to_string());
        }
    };

    if parameter == Parameter::Temperature {
        state.playback.write().await.apply_series(parsed.series.clone());
    }

    let stats = SeriesStats::compute(&parsed.series.values, parsed.series.threshold);
    ApiResponse::ok(serde_json::json!({
        "report": outcome.report(),
        "duplicate": outcome.is_duplicate(),
        "preview": parsed.preview,
        "stats": stats,
    }))
}

/// GET /api/v1/reports/{parameter} — list in upload order.
pub async fn list_reports(
    State(state): State<DashboardState>,
    _auth: SessionAuth,
    Path(parameter): Path<String>,
) -> Response {
    let parameter = match parse_parameter(&parameter) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let reports = state.reports.list(parameter);
    ApiResponse::ok(serde_json::json!({
        "parameter": parameter,
        "count": reports.len(),
        "reports": reports,
    }))
}

/// GET /api/v1/reports/{parameter}/{id}/stats — stats for one report.
pub async fn report_stats(
    State(state): State<DashboardState>,
    _auth: SessionAuth,
    Path((parameter, id)): Path<(String, u64)>,
) -> Response {
    let parameter = match parse_parameter(&parameter) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let Some(report) = state.reports.list(parameter).into_iter().find(|r| r.id == id) else {
        return ApiErrorResponse::not_found(format!("no report {} in {}", id, parameter));
    };

    let stats = SeriesStats::compute(&report.values, report.threshold);
    ApiResponse::ok(serde_json::json!({
        "report": report,
        "stats": stats,
    }))
}

/// DELETE /api/v1/reports/{parameter}/{id} — remove; unknown id is a
/// no-op, not an error.
pub async fn delete_report(
    State(state): State<DashboardState>,
    _auth: SessionAuth,
    Path((parameter, id)): Path<(String, u64)>,
) -> Response {
    let parameter = match parse_parameter(&parameter) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match state.reports.remove(parameter, id) {
        Ok(removed) => ApiResponse::ok(serde_json::json!({ "removed": removed })),
        Err(e) => {
            tracing::error!(error = %e, "failed to persist report removal");
            ApiErrorResponse::internal(e.to_string())
        }
    }
}

/// GET /api/v1/live — playback snapshot for the live display.
pub async fn live(State(state): State<DashboardState>, _auth: SessionAuth) -> Response {
    let snapshot = state.playback.read().await.snapshot();
    ApiResponse::ok(snapshot)
}

/// PUT /api/v1/threshold — user threshold override on the active series.
pub async fn set_threshold(
    State(state): State<DashboardState>,
    _auth: SessionAuth,
    Json(body): Json<ThresholdBody>,
) -> Response {
    if !body.threshold.is_finite() {
        return ApiErrorResponse::bad_request("threshold must be a finite number");
    }

    let mut playback = state.playback.write().await;
    playback.set_threshold(body.threshold);
    ApiResponse::ok(serde_json::json!({ "threshold": playback.threshold() }))
}

/// POST /api/v1/insights — stateless proxy to the text-generation
/// upstream. Payload shape is fixed by the proxy contract, not the
/// envelope: `{insights, success}` on success, `{error, insights}` with a
/// non-2xx status otherwise. Single attempt, no retry.
pub async fn insights(
    State(state): State<DashboardState>,
    Json(request): Json<InsightRequest>,
) -> Response {
    match state.insight.generate(&request.temperature_data.current).await {
        Ok(insights) => Json(InsightReply {
            insights,
            success: true,
        })
        .into_response(),
        Err(e) => {
            let status = match &e {
                crate::insight::InsightError::Upstream(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::BAD_REQUEST,
            };
            tracing::warn!(error = %e, "insight generation failed");
            (
                status,
                Json(InsightFailure {
                    error: e.to_string(),
                    insights: e.fallback_insights(),
                }),
            )
                .into_response()
        }
    }
}
