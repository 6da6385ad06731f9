use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::engagement::handlers;
use crate::features::engagement::services::EngagementService;
use crate::shared::constants::MAX_PHOTO_SIZE;

pub fn routes(engagement_service: Arc<EngagementService>) -> Router {
    Router::new()
        .route("/api/comments", post(handlers::create_comment))
        .route(
            "/api/followups",
            post(handlers::create_follow_up)
                .layer(DefaultBodyLimit::max(MAX_PHOTO_SIZE + 1024 * 1024)),
        )
        .route("/api/reports/{id}/comments", get(handlers::list_comments))
        .route("/api/reports/{id}/followups", get(handlers::list_follow_ups))
        .with_state(engagement_service)
}
