use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::dashboard::handlers;
use crate::features::dashboard::services::DashboardService;

/// Create admin dashboard routes
pub fn routes(dashboard_service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/api/admin/stats", get(handlers::get_stats))
        .route("/api/admin/trends", get(handlers::get_trends))
        .route("/api/admin/by-category", get(handlers::get_by_category))
        .with_state(dashboard_service)
}
