use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch},
    Router,
};

use crate::features::reports::handlers;
use crate::features::reports::services::ReportService;
use crate::shared::constants::{MAX_PHOTO_SIZE, MAX_SUBMISSION_PHOTOS};

/// Create routes for the reports feature
///
/// Public routes: `/public`, `/public/{id}` and `/search`. Everything else
/// expects the auth middleware to be applied by the caller.
pub fn routes(report_service: Arc<ReportService>) -> Router {
    Router::new()
        .route(
            "/api/reports",
            // Room for every photo plus multipart overhead
            axum::routing::post(handlers::create_report).layer(DefaultBodyLimit::max(
                MAX_PHOTO_SIZE * MAX_SUBMISSION_PHOTOS + 1024 * 1024,
            )),
        )
        .route("/api/reports/my", get(handlers::list_my_reports))
        .route("/api/reports/filter", get(handlers::filter_reports))
        .route(
            "/api/reports/{id}",
            get(handlers::get_report).patch(handlers::update_report),
        )
        .route("/api/reports/{id}/history", get(handlers::get_report_history))
        .route("/api/reports/{id}/status", patch(handlers::update_report_status))
        .route(
            "/api/admin/reports/{id}/with-deleted",
            get(handlers::get_report_with_all_photos),
        )
        .with_state(report_service)
}

/// Routes reachable without a bearer token
pub fn public_routes(report_service: Arc<ReportService>) -> Router {
    Router::new()
        .route("/api/reports/public", get(handlers::list_public_reports))
        .route("/api/reports/public/{id}", get(handlers::get_public_report))
        .route("/api/reports/search", get(handlers::search_by_tracking_id))
        .with_state(report_service)
}
