use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::model::Role;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::dashboard::{
    dtos as dashboard_dtos, handlers as dashboard_handlers, models as dashboard_models,
};
use crate::features::engagement::{dtos as engagement_dtos, handlers as engagement_handlers};
use crate::features::evidence::{dtos as evidence_dtos, handlers as evidence_handlers};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::features::users::{dtos as users_dtos, handlers as users_handlers};
use crate::shared::soft_delete::LedgerStats;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports
        reports_handlers::create_report,
        reports_handlers::list_my_reports,
        reports_handlers::filter_reports,
        reports_handlers::search_by_tracking_id,
        reports_handlers::list_public_reports,
        reports_handlers::get_public_report,
        reports_handlers::get_report,
        reports_handlers::get_report_history,
        reports_handlers::update_report_status,
        reports_handlers::update_report,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::get_category,
        categories_handlers::list_category_admins,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        // Engagement
        engagement_handlers::create_comment,
        engagement_handlers::list_comments,
        engagement_handlers::create_follow_up,
        engagement_handlers::list_follow_ups,
        // Evidence (admin)
        evidence_handlers::list_evidence,
        evidence_handlers::evidence_stats,
        evidence_handlers::soft_delete_evidence,
        evidence_handlers::restore_evidence,
        evidence_handlers::hard_delete_evidence,
        reports_handlers::get_report_with_all_photos,
        // Users
        users_handlers::create_user,
        users_handlers::list_users,
        users_handlers::user_stats,
        users_handlers::get_user,
        users_handlers::update_user,
        users_handlers::get_category_admin,
        users_handlers::soft_delete_user,
        users_handlers::restore_user,
        users_handlers::toggle_user_active,
        users_handlers::hard_delete_user,
        // Dashboard (admin)
        dashboard_handlers::get_stats,
        dashboard_handlers::get_trends,
        dashboard_handlers::get_by_category,
    ),
    components(
        schemas(
            Meta,
            Role,
            LedgerStats,
            ApiResponse<LedgerStats>,
            // Reports
            reports_models::ReportStatus,
            reports_models::HistoryEntry,
            reports_dtos::CreateReportFormDto,
            reports_dtos::UpdateReportStatusDto,
            reports_dtos::UpdateReportDto,
            reports_dtos::SubmitterDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::ReportDetailResponseDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            ApiResponse<reports_dtos::ReportDetailResponseDto>,
            ApiResponse<Vec<reports_models::HistoryEntry>>,
            // Categories
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryRequestDto,
            categories_dtos::CategoryAdminDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<Vec<categories_dtos::CategoryAdminDto>>,
            // Engagement
            engagement_dtos::CreateCommentDto,
            engagement_dtos::CommentResponseDto,
            engagement_dtos::CreateFollowUpFormDto,
            engagement_dtos::FollowUpResponseDto,
            ApiResponse<engagement_dtos::CommentResponseDto>,
            ApiResponse<Vec<engagement_dtos::CommentResponseDto>>,
            ApiResponse<engagement_dtos::FollowUpResponseDto>,
            ApiResponse<Vec<engagement_dtos::FollowUpResponseDto>>,
            // Evidence
            evidence_dtos::EvidencePhotoResponseDto,
            ApiResponse<Vec<evidence_dtos::EvidencePhotoResponseDto>>,
            // Users
            users_dtos::CreateUserDto,
            users_dtos::UpdateUserDto,
            users_dtos::CategoryOwnerDto,
            ApiResponse<users_dtos::CategoryOwnerDto>,
            users_dtos::UserResponseDto,
            users_dtos::RoleCountDto,
            users_dtos::UserStatsDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
            ApiResponse<users_dtos::UserStatsDto>,
            // Dashboard
            dashboard_models::TrendPeriod,
            dashboard_models::TrendPoint,
            dashboard_models::CategoryCount,
            dashboard_dtos::StatusCountDto,
            dashboard_dtos::RoleTotalDto,
            dashboard_dtos::DashboardStatsDto,
            dashboard_dtos::TrendsDto,
            ApiResponse<dashboard_dtos::DashboardStatsDto>,
            ApiResponse<dashboard_dtos::TrendsDto>,
            ApiResponse<Vec<dashboard_models::CategoryCount>>,
        )
    ),
    tags(
        (name = "reports", description = "Citizen complaint reports and their status history"),
        (name = "categories", description = "Report categories and their owning admins"),
        (name = "engagement", description = "Comments and admin follow-ups on reports"),
        (name = "evidence", description = "Evidence photo management (admin)"),
        (name = "users", description = "User account administration"),
        (name = "dashboard", description = "Scoped statistics for the admin dashboard"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Pengaduan API",
        version = "0.1.0",
        description = "API documentation for the citizen complaint service",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
