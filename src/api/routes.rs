//! Route table for the dashboard API.

use super::handlers::{self, DashboardState};
use axum::routing::{get, post, put};
use axum::Router;

pub fn api_routes(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/upload/preview", post(handlers::upload_preview))
        .route(
            "/reports/:parameter",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route(
            "/reports/:parameter/:id",
            axum::routing::delete(handlers::delete_report),
        )
        .route("/reports/:parameter/:id/stats", get(handlers::report_stats))
        .route("/live", get(handlers::live))
        .route("/threshold", put(handlers::set_threshold))
        .route("/insights", post(handlers::insights))
        .with_state(state)
}
