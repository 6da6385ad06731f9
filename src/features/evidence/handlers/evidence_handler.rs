use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::core::error::Result;
use crate::features::auth::guards::RequireAdmin;
use crate::features::evidence::dtos::{EvidencePhotoResponseDto, LedgerListQuery};
use crate::features::evidence::services::EvidenceService;
use crate::shared::soft_delete::LedgerStats;
use crate::shared::types::{ApiResponse, Meta};

/// List evidence photos in the caller's scope
#[utoipa::path(
    get,
    path = "/api/admin/evidence",
    tag = "evidence",
    params(LedgerListQuery),
    responses(
        (status = 200, description = "Evidence photos", body = ApiResponse<Vec<EvidencePhotoResponseDto>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_evidence(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<EvidenceService>>,
    Query(query): Query<LedgerListQuery>,
) -> Result<Json<ApiResponse<Vec<EvidencePhotoResponseDto>>>> {
    let photos = service.list(&principal, query.mode()).await?;
    let dtos: Vec<EvidencePhotoResponseDto> = photos.into_iter().map(Into::into).collect();
    let meta = Meta {
        total: dtos.len() as i64,
    };
    Ok(Json(ApiResponse::success(Some(dtos), None, Some(meta))))
}

/// Evidence photo counts by deletion state
#[utoipa::path(
    get,
    path = "/api/admin/evidence/stats",
    tag = "evidence",
    responses(
        (status = 200, description = "Ledger counts", body = ApiResponse<LedgerStats>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn evidence_stats(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<EvidenceService>>,
) -> Result<Json<ApiResponse<LedgerStats>>> {
    let stats = service.stats(&principal).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Soft-delete an evidence photo
#[utoipa::path(
    delete,
    path = "/api/admin/evidence/{id}",
    tag = "evidence",
    params(("id" = i64, Path, description = "Evidence photo ID")),
    responses(
        (status = 200, description = "Photo soft-deleted"),
        (status = 403, description = "Photo's report outside the caller's scope"),
        (status = 404, description = "Photo not found"),
        (status = 409, description = "Photo already deleted")
    ),
    security(("bearer_auth" = []))
)]
pub async fn soft_delete_evidence(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<EvidenceService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.soft_delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Evidence photo deleted".to_string()),
        None,
    )))
}

/// Restore a soft-deleted evidence photo
#[utoipa::path(
    post,
    path = "/api/admin/evidence/{id}/restore",
    tag = "evidence",
    params(("id" = i64, Path, description = "Evidence photo ID")),
    responses(
        (status = 200, description = "Photo restored"),
        (status = 403, description = "Photo's report outside the caller's scope"),
        (status = 404, description = "No deleted photo with this ID")
    ),
    security(("bearer_auth" = []))
)]
pub async fn restore_evidence(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<EvidenceService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.restore(&principal, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Evidence photo restored".to_string()),
        None,
    )))
}

/// Permanently delete an evidence photo
#[utoipa::path(
    delete,
    path = "/api/admin/evidence/{id}/permanent",
    tag = "evidence",
    params(("id" = i64, Path, description = "Evidence photo ID")),
    responses(
        (status = 200, description = "Photo removed"),
        (status = 403, description = "Photo's report outside the caller's scope"),
        (status = 404, description = "Photo not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn hard_delete_evidence(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<EvidenceService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.hard_delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Evidence photo permanently deleted".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::features::access::{EmptyScopePolicy, ScopeResolver};
    use crate::features::auth::model::Role;
    use crate::features::evidence::models::NewEvidencePhoto;
    use crate::features::evidence::routes::routes;
    use crate::modules::store::{MemoryStore, ReportStore, UnitOfWork};
    use crate::shared::test_helpers::{new_report, principal, seed_user, with_principal};

    async fn server_with_photo(role: Role) -> (TestServer, i64) {
        let store = Arc::new(MemoryStore::new());
        let owner = seed_user(&store, Role::Citizen).await;
        let admin = seed_user(&store, role).await;

        let mut uow = store.begin().await.unwrap();
        let report = uow
            .insert_report(new_report(owner.id, "YK2401012222"))
            .await
            .unwrap();
        let photo = uow
            .insert_photo(NewEvidencePhoto {
                report_id: report.id,
                path: "evidence/20240101000000_a.jpg".to_string(),
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let scopes = Arc::new(ScopeResolver::new(
            store.clone(),
            EmptyScopePolicy::Unrestricted,
        ));
        let service = Arc::new(EvidenceService::new(store, scopes));
        let app = with_principal(routes(service), principal(admin.id, role));
        (TestServer::new(app).unwrap(), photo.id)
    }

    #[tokio::test]
    async fn test_soft_delete_then_list_only_deleted() {
        let (server, photo_id) = server_with_photo(Role::Admin).await;

        server
            .delete(&format!("/api/admin/evidence/{}", photo_id))
            .await
            .assert_status_ok();
        server
            .delete(&format!("/api/admin/evidence/{}", photo_id))
            .await
            .assert_status(StatusCode::CONFLICT);

        let body: Value = server
            .get("/api/admin/evidence")
            .add_query_param("only_deleted", "true")
            .await
            .json();
        assert_eq!(body["meta"]["total"], 1);
        assert!(body["data"][0]["deleted_at"].is_string());

        let body: Value = server.get("/api/admin/evidence/stats").await.json();
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["deleted"], 1);
    }

    #[tokio::test]
    async fn test_restore_of_live_photo_is_not_found() {
        let (server, photo_id) = server_with_photo(Role::Superadmin).await;
        server
            .post(&format!("/api/admin/evidence/{}/restore", photo_id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_citizen_is_forbidden() {
        let (server, photo_id) = server_with_photo(Role::Citizen).await;
        server
            .delete(&format!("/api/admin/evidence/{}/permanent", photo_id))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
