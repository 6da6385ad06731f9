use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::auth::model::Role;
use crate::features::dashboard::models::{TrendPeriod, TrendPoint};
use crate::features::reports::models::ReportStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusCountDto {
    pub status: ReportStatus,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleTotalDto {
    pub role: Role,
    pub total: i64,
}

/// Headline numbers for the admin dashboard, limited to the caller's scope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStatsDto {
    pub total_reports: i64,
    /// Every status is present, zero when no report has it
    pub by_status: Vec<StatusCountDto>,
    /// Live accounts per role
    pub users_by_role: Vec<RoleTotalDto>,
    pub total_comments: i64,
    pub total_follow_ups: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrendQuery {
    /// `week` (default) or `month`
    pub period: Option<String>,
}

/// Most recent buckets first
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrendsDto {
    pub period: TrendPeriod,
    pub reports: Vec<TrendPoint>,
    pub comments: Vec<TrendPoint>,
    pub follow_ups: Vec<TrendPoint>,
}
