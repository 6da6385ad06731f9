use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for category. `user_id` is the owning admin.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating or replacing a category
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub user_id: Option<i64>,
}
