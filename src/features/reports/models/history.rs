use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::ReportStatus;

/// Immutable audit record for one status change
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct HistoryEntry {
    pub id: i64,
    pub report_id: i64,
    pub status: ReportStatus,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub report_id: i64,
    pub status: ReportStatus,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}
