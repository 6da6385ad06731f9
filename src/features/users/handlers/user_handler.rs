use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{RequireAdmin, RequireSuperAdmin};
use crate::features::auth::model::Principal;
use crate::features::evidence::dtos::LedgerListQuery;
use crate::features::users::dtos::{
    CategoryAdminQuery, CategoryOwnerDto, CreateUserDto, UpdateUserDto, UserResponseDto,
    UserStatsDto,
};
use crate::features::users::models::NewUser;
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta};

/// Register an account (superadmin only)
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Superadmin access required"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    RequireSuperAdmin(principal): RequireSuperAdmin,
    State(service): State<Arc<UserService>>,
    AppJson(dto): AppJson<CreateUserDto>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service
        .create(
            &principal,
            NewUser {
                name: dto.name.trim().to_string(),
                email: dto.email.trim().to_lowercase(),
                role: dto.role,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user.into()),
            Some("User created".to_string()),
            None,
        )),
    ))
}

/// List user accounts
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(LedgerListQuery),
    responses(
        (status = 200, description = "Users", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 403, description = "Unrestricted admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Query(query): Query<LedgerListQuery>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let users = service.list(&principal, query.mode()).await?;
    let dtos: Vec<UserResponseDto> = users.into_iter().map(Into::into).collect();
    let meta = Meta {
        total: dtos.len() as i64,
    };
    Ok(Json(ApiResponse::success(Some(dtos), None, Some(meta))))
}

/// Account counts by deletion state and role
#[utoipa::path(
    get,
    path = "/api/users/stats",
    tag = "users",
    responses(
        (status = 200, description = "User statistics", body = ApiResponse<UserStatsDto>),
        (status = 403, description = "Unrestricted admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_stats(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
) -> Result<Json<ApiResponse<UserStatsDto>>> {
    let stats = service.stats(&principal).await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserResponseDto>),
        (status = 403, description = "Unrestricted admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let user = service.get(&principal, id).await?;
    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}

/// Edit name, email or role of an account
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Validation error or own role change"),
        (status = 403, description = "Role or account outside the caller's authority"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateUserDto>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.update(&principal, id, dto.into()).await?;
    Ok(Json(ApiResponse::success(
        Some(user.into()),
        Some("User updated".to_string()),
        None,
    )))
}

/// Who handles reports in a category
#[utoipa::path(
    get,
    path = "/api/users/category-admin",
    tag = "users",
    params(CategoryAdminQuery),
    responses(
        (status = 200, description = "Admin owning the category", body = ApiResponse<CategoryOwnerDto>),
        (status = 404, description = "Category not found or without an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_category_admin(
    _principal: Principal,
    State(service): State<Arc<UserService>>,
    Query(query): Query<CategoryAdminQuery>,
) -> Result<Json<ApiResponse<CategoryOwnerDto>>> {
    let admin = service.category_admin(query.category_id).await?;
    Ok(Json(ApiResponse::success(Some(admin.into()), None, None)))
}

/// Soft-delete an account
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User soft-deleted"),
        (status = 403, description = "Unrestricted admin access required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User already deleted")
    ),
    security(("bearer_auth" = []))
)]
pub async fn soft_delete_user(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.soft_delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("User deleted".to_string()),
        None,
    )))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}/restore",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User restored"),
        (status = 403, description = "Unrestricted admin access required"),
        (status = 404, description = "No deleted user with this ID")
    ),
    security(("bearer_auth" = []))
)]
pub async fn restore_user(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.restore(&principal, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("User restored".to_string()),
        None,
    )))
}

/// Flip the active flag of a live account
#[utoipa::path(
    patch,
    path = "/api/users/{id}/toggle-active",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Active flag flipped", body = ApiResponse<UserResponseDto>),
        (status = 403, description = "Unrestricted admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_user_active(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let user = service.toggle_active(&principal, id).await?;
    Ok(Json(ApiResponse::success(Some(user.into()), None, None)))
}

/// Permanently delete an account (superadmin only)
#[utoipa::path(
    delete,
    path = "/api/users/{id}/permanent",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User removed"),
        (status = 403, description = "Superadmin access required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still owns reports")
    ),
    security(("bearer_auth" = []))
)]
pub async fn hard_delete_user(
    RequireSuperAdmin(principal): RequireSuperAdmin,
    State(service): State<Arc<UserService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.hard_delete(&principal, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("User permanently deleted".to_string()),
        None,
    )))
}
