use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireAdmin;
use crate::features::categories::dtos::{
    CategoryAdminDto, CategoryRequestDto, CategoryResponseDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, Meta};

/// List all categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<CategoryResponseDto>>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponseDto>>>> {
    let categories: Vec<CategoryResponseDto> =
        service.list().await?.into_iter().map(Into::into).collect();
    let meta = Meta {
        total: categories.len() as i64,
    };
    Ok(Json(ApiResponse::success(Some(categories), None, Some(meta))))
}

/// Get category by ID
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(category.into()), None, None)))
}

/// Admin accounts that can be assigned as category owners
#[utoipa::path(
    get,
    path = "/api/categories/admins",
    responses(
        (status = 200, description = "Admin accounts", body = ApiResponse<Vec<CategoryAdminDto>>),
        (status = 403, description = "Admin access required")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn list_category_admins(
    RequireAdmin(_principal): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryAdminDto>>>> {
    let admins: Vec<CategoryAdminDto> = service
        .list_admins()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ApiResponse::success(Some(admins), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryRequestDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Unrestricted admin access required"),
        (status = 409, description = "Category name already exists")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CategoryRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.create(&principal, dto.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category.into()),
            Some("Category created".to_string()),
            None,
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryRequestDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Unrestricted admin access required"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category name already exists")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<CategoryRequestDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let category = service.update(&principal, id, dto.into()).await?;
    Ok(Json(ApiResponse::success(
        Some(category.into()),
        Some("Category updated".to_string()),
        None,
    )))
}

/// Delete a category; its reports become uncategorised
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 403, description = "Unrestricted admin access required"),
        (status = 404, description = "Category not found")
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Category deleted".to_string()),
        None,
    )))
}
