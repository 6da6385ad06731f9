use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Admin note on the handling of a report, optionally with a photo
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct FollowUp {
    pub id: i64,
    pub report_id: i64,
    pub admin_id: i64,
    pub description: String,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFollowUp {
    pub report_id: i64,
    pub admin_id: i64,
    pub description: String,
    pub photo_path: Option<String>,
}
