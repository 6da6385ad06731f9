use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::auth::model::Role;
use crate::features::categories::models::{Category, CategoryInput};
use crate::features::users::models::User;

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: i64,
    pub name: String,
    /// Owning admin; reports in this category fall in that admin's scope
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            user_id: c.user_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Request DTO for creating or replacing a category
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequestDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl From<CategoryRequestDto> for CategoryInput {
    fn from(dto: CategoryRequestDto) -> Self {
        Self {
            name: dto.name.trim().to_string(),
            user_id: dto.user_id,
        }
    }
}

/// Admin account that can own categories
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryAdminDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for CategoryAdminDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
        }
    }
}
