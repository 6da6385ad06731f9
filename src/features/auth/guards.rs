//! Role-based authorization guards for the application.
//!
//! Role hierarchy (from highest to lowest):
//! - superadmin: global administrator, always unrestricted
//! - admin / category_admin: triage reports within their owned categories
//! - citizen: submits and tracks their own reports
//!
//! Guards only check the role tier. Category scope is enforced by the
//! services through the access scope resolver.

use crate::core::error::AppError;
use crate::features::auth::model::Principal;
use axum::{extract::FromRequestParts, http::request::Parts};

fn principal_from_parts(parts: &Parts) -> Result<&Principal, AppError> {
    parts
        .extensions
        .get::<Principal>()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Guard for checking if the principal holds the superadmin role.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireSuperAdmin(principal): RequireSuperAdmin) { ... }
/// ```
pub struct RequireSuperAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts)?;

        if !principal.is_superadmin() {
            return Err(AppError::Forbidden(
                "Superadmin access required".to_string(),
            ));
        }

        Ok(RequireSuperAdmin(principal.clone()))
    }
}

/// Guard for any admin tier (admin, category_admin, superadmin).
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(principal): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts)?;

        if !principal.is_admin_tier() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(principal.clone()))
    }
}
