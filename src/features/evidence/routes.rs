use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::features::evidence::handlers;
use crate::features::evidence::services::EvidenceService;

/// Create routes for evidence photo management
pub fn routes(evidence_service: Arc<EvidenceService>) -> Router {
    Router::new()
        .route("/api/admin/evidence", get(handlers::list_evidence))
        .route("/api/admin/evidence/stats", get(handlers::evidence_stats))
        .route(
            "/api/admin/evidence/{id}",
            delete(handlers::soft_delete_evidence),
        )
        .route(
            "/api/admin/evidence/{id}/restore",
            post(handlers::restore_evidence),
        )
        .route(
            "/api/admin/evidence/{id}/permanent",
            delete(handlers::hard_delete_evidence),
        )
        .with_state(evidence_service)
}
