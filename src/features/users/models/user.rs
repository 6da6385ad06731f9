use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::features::auth::model::Role;
use crate::shared::soft_delete::LedgerEntity;

/// Database model for a user account
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Partial edit of an account; `None` leaves the field as it is
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Full set of editable fields written back to the store
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl LedgerEntity for User {
    const LABEL: &'static str = "User";
}
