use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::core::error::Result;
use crate::features::auth::guards::RequireAdmin;
use crate::features::dashboard::dtos::{DashboardStatsDto, TrendQuery, TrendsDto};
use crate::features::dashboard::models::{CategoryCount, TrendPeriod};
use crate::features::dashboard::services::DashboardService;
use crate::shared::types::ApiResponse;

/// Report, user and engagement totals within the caller's scope
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStatsDto>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stats(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<DashboardStatsDto>>> {
    let stats = service.stats(&principal).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Weekly or monthly activity over the last twelve buckets
#[utoipa::path(
    get,
    path = "/api/admin/trends",
    tag = "dashboard",
    params(TrendQuery),
    responses(
        (status = 200, description = "Trend series", body = ApiResponse<TrendsDto>),
        (status = 400, description = "Unknown period"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_trends(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<DashboardService>>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<ApiResponse<TrendsDto>>> {
    let period = match query.period.as_deref().map(str::trim) {
        None | Some("") => TrendPeriod::default(),
        Some(raw) => raw.parse()?,
    };
    let trends = service.trends(&principal, period).await?;
    Ok(Json(ApiResponse::success(Some(trends), None, None)))
}

/// Report counts per category, uncategorised included
#[utoipa::path(
    get,
    path = "/api/admin/by-category",
    tag = "dashboard",
    responses(
        (status = 200, description = "Counts per category", body = ApiResponse<Vec<CategoryCount>>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_by_category(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<DashboardService>>,
) -> Result<Json<ApiResponse<Vec<CategoryCount>>>> {
    let counts = service.by_category(&principal).await?;
    Ok(Json(ApiResponse::success(Some(counts), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::features::access::{EmptyScopePolicy, ScopeResolver};
    use crate::features::auth::model::Role;
    use crate::features::dashboard::routes::routes;
    use crate::modules::store::MemoryStore;
    use crate::shared::test_helpers::{principal, seed_user, with_principal};

    async fn server_as(role: Role) -> TestServer {
        let store = Arc::new(MemoryStore::new());
        let me = seed_user(&store, role).await;
        let scopes = Arc::new(ScopeResolver::new(
            store.clone(),
            EmptyScopePolicy::Unrestricted,
        ));
        let service = Arc::new(DashboardService::new(store, scopes));
        TestServer::new(with_principal(routes(service), principal(me.id, role))).unwrap()
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let server = server_as(Role::Superadmin).await;

        let body: Value = server.get("/api/admin/stats").await.json();
        assert_eq!(body["data"]["total_reports"], 0);
        assert_eq!(body["data"]["by_status"].as_array().unwrap().len(), 4);
        assert_eq!(body["data"]["by_status"][0]["status"], "Diajukan");

        let body: Value = server.get("/api/admin/trends").await.json();
        assert_eq!(body["data"]["period"], "week");
    }

    #[tokio::test]
    async fn test_unknown_period_is_rejected() {
        let server = server_as(Role::Admin).await;
        server
            .get("/api/admin/trends")
            .add_query_param("period", "year")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_citizen_is_forbidden() {
        let server = server_as(Role::Citizen).await;
        server
            .get("/api/admin/by-category")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
