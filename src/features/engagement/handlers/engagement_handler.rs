use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::Principal;
use crate::features::engagement::dtos::{
    CommentResponseDto, CreateCommentDto, CreateFollowUpFormDto, FollowUpResponseDto,
};
use crate::features::engagement::services::EngagementService;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::upload::{parse_optional_id, read_photo, read_text};

/// Comment on a report
#[utoipa::path(
    post,
    path = "/api/comments",
    tag = "engagement",
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment added", body = ApiResponse<CommentResponseDto>),
        (status = 400, description = "Empty comment"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_comment(
    principal: Principal,
    State(service): State<Arc<EngagementService>>,
    AppJson(dto): AppJson<CreateCommentDto>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let view = service
        .add_comment(&principal, dto.report_id, &dto.text)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(view.into()),
            Some("Comment added".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/comments",
    tag = "engagement",
    params(("id" = i64, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Comments, newest first", body = ApiResponse<Vec<CommentResponseDto>>),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_comments(
    _principal: Principal,
    State(service): State<Arc<EngagementService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CommentResponseDto>>>> {
    let comments: Vec<CommentResponseDto> = service
        .list_comments(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let meta = Meta {
        total: comments.len() as i64,
    };
    Ok(Json(ApiResponse::success(Some(comments), None, Some(meta))))
}

/// Record how a report is being handled (admin only)
///
/// Accepts multipart/form-data with `report_id`, `description` and an
/// optional `photo`.
#[utoipa::path(
    post,
    path = "/api/followups",
    tag = "engagement",
    request_body(
        content = CreateFollowUpFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Follow-up recorded", body = ApiResponse<FollowUpResponseDto>),
        (status = 400, description = "Missing report or description, or invalid photo"),
        (status = 403, description = "Report outside the caller's scope"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_follow_up(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<EngagementService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FollowUpResponseDto>>)> {
    let mut report_id = None;
    let mut description = String::new();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "report_id" => report_id = parse_optional_id(&read_text(field).await?, "report_id")?,
            "description" => description = read_text(field).await?,
            "photo" | "foto" => {
                // Browsers send an empty part when no file was chosen
                if field.file_name().is_some_and(|n| !n.is_empty()) {
                    photo = Some(read_photo(field).await?);
                }
            }
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    let report_id =
        report_id.ok_or_else(|| AppError::Validation("report_id is required".to_string()))?;

    let follow_up = service
        .add_follow_up(&principal, report_id, &description, photo)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(follow_up.into()),
            Some("Follow-up recorded".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}/followups",
    tag = "engagement",
    params(("id" = i64, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Follow-ups, newest first", body = ApiResponse<Vec<FollowUpResponseDto>>),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_follow_ups(
    _principal: Principal,
    State(service): State<Arc<EngagementService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<FollowUpResponseDto>>>> {
    let follow_ups: Vec<FollowUpResponseDto> = service
        .list_follow_ups(id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let meta = Meta {
        total: follow_ups.len() as i64,
    };
    Ok(Json(ApiResponse::success(Some(follow_ups), None, Some(meta))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::features::access::{EmptyScopePolicy, ScopeResolver};
    use crate::features::auth::model::Role;
    use crate::features::engagement::routes::routes;
    use crate::modules::storage::LocalFileStore;
    use crate::modules::store::{MemoryStore, ReportStore, UnitOfWork};
    use crate::shared::test_helpers::{new_report, principal, seed_user, with_principal};

    async fn server_as(role: Role) -> (TestServer, i64) {
        let store = Arc::new(MemoryStore::new());
        let me = seed_user(&store, role).await;
        let author = seed_user(&store, Role::Citizen).await;

        let mut uow = store.begin().await.unwrap();
        let report = uow
            .insert_report(new_report(author.id, "YK2401016666"))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let root = std::env::temp_dir().join(format!("pengaduan-eng-http-{}", uuid::Uuid::new_v4()));
        let scopes = Arc::new(ScopeResolver::new(
            store.clone(),
            EmptyScopePolicy::Unrestricted,
        ));
        let service = Arc::new(EngagementService::new(
            store,
            Arc::new(LocalFileStore::new(root)),
            scopes,
        ));
        let app = with_principal(routes(service), principal(me.id, role));
        (TestServer::new(app).unwrap(), report.id)
    }

    #[tokio::test]
    async fn test_comment_round_trip() {
        let (server, report_id) = server_as(Role::Citizen).await;

        server
            .post("/api/comments")
            .json(&json!({ "report_id": report_id, "text": "Mohon segera ditangani" }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/comments")
            .json(&json!({ "report_id": report_id, "text": "" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let body: Value = server
            .get(&format!("/api/reports/{}/comments", report_id))
            .await
            .json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["data"][0]["text"], "Mohon segera ditangani");
    }

    #[tokio::test]
    async fn test_follow_up_with_photo() {
        let (server, report_id) = server_as(Role::Superadmin).await;

        let form = MultipartForm::new()
            .add_text("report_id", report_id.to_string())
            .add_text("description", "Tim sudah ke lokasi")
            .add_part(
                "photo",
                Part::bytes(vec![0x89, 0x50, 0x4E, 0x47])
                    .file_name("lokasi.png")
                    .mime_type("image/png"),
            );
        let response = server.post("/api/followups").multipart(form).await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert!(body["data"]["photo_path"]
            .as_str()
            .unwrap()
            .starts_with("evidence/"));

        let body: Value = server
            .get(&format!("/api/reports/{}/followups", report_id))
            .await
            .json();
        assert_eq!(body["meta"]["total"], 1);
    }

    #[tokio::test]
    async fn test_citizen_cannot_follow_up() {
        let (server, report_id) = server_as(Role::Citizen).await;
        let form = MultipartForm::new()
            .add_text("report_id", report_id.to_string())
            .add_text("description", "Saya tindak lanjuti");
        server
            .post("/api/followups")
            .multipart(form)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}
