use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::auth::model::Principal;
use crate::features::reports::dtos::{
    CreateReportFormDto, ReportDetailResponseDto, ReportFieldsDto, ReportFilterQuery,
    ReportResponseDto, TrackingIdQuery, UpdateReportDto, UpdateReportStatusDto,
};
use crate::features::reports::models::{HistoryEntry, ReportStatus, ReportSubmission};
use crate::features::reports::services::ReportService;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::upload::{parse_flag, parse_optional_id, read_photo, read_text};

fn list_response(dtos: Vec<ReportResponseDto>) -> Json<ApiResponse<Vec<ReportResponseDto>>> {
    let meta = Meta {
        total: dtos.len() as i64,
    };
    Json(ApiResponse::success(Some(dtos), None, Some(meta)))
}

/// Submit a report with evidence photos
///
/// Accepts multipart/form-data. Photos are sent as repeated `photos` fields.
#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "reports",
    request_body(
        content = CreateReportFormDto,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 201, description = "Report submitted", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Invalid form, coordinates or photo count"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Tracking ID could not be allocated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_report(
    principal: Principal,
    State(service): State<Arc<ReportService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    let mut fields = ReportFieldsDto::default();
    let mut latitude = String::new();
    let mut longitude = String::new();
    let mut category_id = None;
    let mut is_anonymous = false;
    let mut photos = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "photos" | "photo" | "foto" => photos.push(read_photo(field).await?),
            "title" => fields.title = read_text(field).await?,
            "region" | "wilayah" => fields.region = read_text(field).await?,
            "location" | "lokasi" => fields.location = read_text(field).await?,
            "description" => fields.description = read_text(field).await?,
            "latitude" => latitude = read_text(field).await?,
            "longitude" => longitude = read_text(field).await?,
            "category_id" => {
                category_id = parse_optional_id(&read_text(field).await?, "category_id")?
            }
            "is_anonymous" => is_anonymous = parse_flag(&read_text(field).await?),
            _ => debug!("Ignoring unknown field: {}", field_name),
        }
    }

    fields
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service
        .create(
            &principal,
            ReportSubmission {
                title: fields.title,
                region: fields.region,
                location: fields.location,
                description: fields.description,
                latitude,
                longitude,
                category_id,
                is_anonymous,
                photos,
            },
        )
        .await?;

    let detail = service.get_by_id(&principal, report.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(detail.view.into()),
            Some(format!("Report submitted with tracking ID {}", report.tracking_id)),
            None,
        )),
    ))
}

/// List the caller's own reports
#[utoipa::path(
    get,
    path = "/api/reports/my",
    tag = "reports",
    responses(
        (status = 200, description = "Caller's reports, newest first", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_reports(
    principal: Principal,
    State(service): State<Arc<ReportService>>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let views = service.list_mine(&principal).await?;
    Ok(list_response(views.into_iter().map(Into::into).collect()))
}

/// List reports visible to the caller, optionally within a time window
#[utoipa::path(
    get,
    path = "/api/reports/filter",
    tag = "reports",
    params(ReportFilterQuery),
    responses(
        (status = 200, description = "Reports in scope, newest first", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 400, description = "Invalid filter or month"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn filter_reports(
    principal: Principal,
    State(service): State<Arc<ReportService>>,
    Query(query): Query<ReportFilterQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let views = service
        .list_filtered(&principal, query.filter.as_deref(), query.month.as_deref())
        .await?;
    Ok(list_response(views.into_iter().map(Into::into).collect()))
}

/// Look up a report by tracking ID (public)
#[utoipa::path(
    get,
    path = "/api/reports/search",
    tag = "reports",
    params(TrackingIdQuery),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportDetailResponseDto>),
        (status = 400, description = "Malformed tracking ID"),
        (status = 404, description = "No report with this tracking ID")
    )
)]
pub async fn search_by_tracking_id(
    State(service): State<Arc<ReportService>>,
    Query(query): Query<TrackingIdQuery>,
) -> Result<Json<ApiResponse<ReportDetailResponseDto>>> {
    let detail = service.get_by_tracking_id(&query.tracking_id).await?;
    Ok(Json(ApiResponse::success(Some(detail.into()), None, None)))
}

/// Latest reports for the landing page (public)
#[utoipa::path(
    get,
    path = "/api/reports/public",
    tag = "reports",
    responses(
        (status = 200, description = "Latest reports", body = ApiResponse<Vec<ReportResponseDto>>)
    )
)]
pub async fn list_public_reports(
    State(service): State<Arc<ReportService>>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let views = service.latest_public().await?;
    Ok(list_response(views.into_iter().map(Into::into).collect()))
}

/// Get a report with its evidence and history (public)
#[utoipa::path(
    get,
    path = "/api/reports/public/{id}",
    tag = "reports",
    params(("id" = i64, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportDetailResponseDto>),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_public_report(
    State(service): State<Arc<ReportService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReportDetailResponseDto>>> {
    let detail = service.get_public(id).await?;
    Ok(Json(ApiResponse::success(Some(detail.into()), None, None)))
}

/// Get a report by ID
///
/// Available to the report's author and to admins whose scope covers it.
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "reports",
    params(("id" = i64, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportDetailResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Report outside the caller's scope"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_report(
    principal: Principal,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReportDetailResponseDto>>> {
    let detail = service.get_by_id(&principal, id).await?;
    Ok(Json(ApiResponse::success(Some(detail.into()), None, None)))
}

/// Status history of a report, newest first
#[utoipa::path(
    get,
    path = "/api/reports/{id}/history",
    tag = "reports",
    params(("id" = i64, Path, description = "Report ID")),
    responses(
        (status = 200, description = "History entries", body = ApiResponse<Vec<HistoryEntry>>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Report outside the caller's scope"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_report_history(
    principal: Principal,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>> {
    let history = service.history(&principal, id).await?;
    Ok(Json(ApiResponse::success(Some(history), None, None)))
}

/// Change report status (admin only)
#[utoipa::path(
    patch,
    path = "/api/reports/{id}/status",
    tag = "reports",
    params(("id" = i64, Path, description = "Report ID")),
    request_body = UpdateReportStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Report outside the caller's scope"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_report_status(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateReportStatusDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let status: ReportStatus = dto.status.trim().parse()?;

    service
        .update_status(&principal, id, status, dto.description.as_deref())
        .await?;
    let detail = service.get_by_id(&principal, id).await?;

    Ok(Json(ApiResponse::success(
        Some(detail.view.into()),
        Some("Status and history updated".to_string()),
        None,
    )))
}

/// Edit report fields (admin only)
#[utoipa::path(
    patch,
    path = "/api/reports/{id}",
    tag = "reports",
    params(("id" = i64, Path, description = "Report ID")),
    request_body = UpdateReportDto,
    responses(
        (status = 200, description = "Report updated", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Invalid field value"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Report or target category outside the caller's scope"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_report(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateReportDto>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    service.update_metadata(&principal, id, dto.into()).await?;
    let detail = service.get_by_id(&principal, id).await?;

    Ok(Json(ApiResponse::success(
        Some(detail.view.into()),
        Some("Report updated".to_string()),
        None,
    )))
}

/// Get a report with every evidence photo, soft-deleted ones included (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/reports/{id}/with-deleted",
    tag = "evidence",
    params(("id" = i64, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report with all photos", body = ApiResponse<ReportDetailResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Report outside the caller's scope"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_report_with_all_photos(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<ReportService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ReportDetailResponseDto>>> {
    let detail = service.get_with_all_photos(&principal, id).await?;
    Ok(Json(ApiResponse::success(Some(detail.into()), None, None)))
}
