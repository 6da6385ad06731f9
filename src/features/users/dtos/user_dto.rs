use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::auth::model::Role;
use crate::features::users::models::{User, UserUpdate};
use crate::shared::soft_delete::LedgerStats;

/// Request DTO for registering an account
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Citizen
}

/// Request DTO for editing an account; omitted fields stay unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl From<UpdateUserDto> for UserUpdate {
    fn from(dto: UpdateUserDto) -> Self {
        Self {
            name: dto.name,
            email: dto.email,
            role: dto.role,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CategoryAdminQuery {
    pub category_id: i64,
}

/// Public face of the admin handling a category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryOwnerDto {
    pub user_id: i64,
    pub name: String,
}

impl From<User> for CategoryOwnerDto {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id,
            name: u.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponseDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            is_active: u.is_active,
            created_at: u.created_at,
            deleted_at: u.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleCountDto {
    pub role: Role,
    pub total: i64,
}

/// Ledger counts plus live accounts per role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserStatsDto {
    #[serde(flatten)]
    pub ledger: LedgerStats,
    pub by_role: Vec<RoleCountDto>,
}
