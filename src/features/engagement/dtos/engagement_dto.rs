use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::engagement::models::{CommentView, FollowUp};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentDto {
    pub report_id: i64,
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponseDto {
    pub id: i64,
    pub report_id: i64,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentView> for CommentResponseDto {
    fn from(v: CommentView) -> Self {
        Self {
            id: v.comment.id,
            report_id: v.comment.report_id,
            author_name: v.author_name,
            text: v.comment.text,
            created_at: v.comment.created_at,
        }
    }
}

/// Multipart form for a follow-up (OpenAPI schema only)
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateFollowUpFormDto {
    pub report_id: i64,
    pub description: String,
    /// Optional photo of the work done (JPEG, PNG or WebP, max 5MB)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FollowUpResponseDto {
    pub id: i64,
    pub report_id: i64,
    pub admin_id: i64,
    pub description: String,
    pub photo_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FollowUp> for FollowUpResponseDto {
    fn from(f: FollowUp) -> Self {
        Self {
            id: f.id,
            report_id: f.report_id,
            admin_id: f.admin_id,
            description: f.description,
            photo_path: f.photo_path,
            created_at: f.created_at,
        }
    }
}
