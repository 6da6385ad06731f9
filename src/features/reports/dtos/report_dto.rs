use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::evidence::dtos::EvidencePhotoResponseDto;
use crate::features::reports::models::{
    HistoryEntry, ReportChanges, ReportDetail, ReportStatus, ReportView, Submitter,
};
use crate::shared::types::Patch;

/// Multipart form for submitting a report
/// Note: This struct is for Swagger UI documentation only.
/// The handler reads the form with axum's Multipart extractor.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateReportFormDto {
    #[schema(example = "Jalan berlubang")]
    pub title: String,
    /// Region responsible for the report. `wilayah` is accepted as an alias.
    #[schema(example = "Sleman")]
    pub region: String,
    /// Street address. `lokasi` is accepted as an alias.
    #[schema(example = "Jl. Kaliurang km 5")]
    pub location: String,
    pub description: String,
    #[schema(example = "-7.7925")]
    pub latitude: String,
    #[schema(example = "110.3658")]
    pub longitude: String,
    pub category_id: Option<i64>,
    /// Hide the submitter's identity from other viewers
    pub is_anonymous: Option<bool>,
    /// One to three evidence photos, repeated `photos` fields
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub photos: Vec<String>,
}

/// Text fields of a submission, validated after the form is read
#[derive(Debug, Default, Validate)]
pub struct ReportFieldsDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Region must be 1-100 characters"))]
    pub region: String,
    #[validate(length(min = 1, max = 255, message = "Location must be 1-255 characters"))]
    pub location: String,
    #[validate(length(min = 1, max = 5000, message = "Description must be 1-5000 characters"))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReportStatusDto {
    /// One of `Diajukan`, `Diproses`, `Selesai`, `Ditolak`
    #[validate(length(min = 1, message = "status is required"))]
    #[schema(example = "Diproses")]
    pub status: String,
    /// History description. A default text is used when empty.
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// Partial report update. Omitted fields are left unchanged; `null` clears
/// text fields and the category.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateReportDto {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub title: Patch<String>,
    #[serde(default, alias = "wilayah")]
    #[schema(value_type = Option<String>)]
    pub region: Patch<String>,
    #[serde(default, alias = "lokasi")]
    #[schema(value_type = Option<String>)]
    pub location: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub latitude: Patch<f64>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub longitude: Patch<f64>,
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub category_id: Patch<i64>,
}

impl From<UpdateReportDto> for ReportChanges {
    fn from(dto: UpdateReportDto) -> Self {
        Self {
            title: dto.title,
            region: dto.region,
            location: dto.location,
            description: dto.description,
            latitude: dto.latitude,
            longitude: dto.longitude,
            category_id: dto.category_id,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportFilterQuery {
    /// `today`, `week` or `month`
    pub filter: Option<String>,
    /// Explicit month `YYYY-MM`; takes precedence over `filter`
    pub month: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrackingIdQuery {
    #[param(example = "YK2401311234")]
    pub tracking_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitterDto {
    pub name: String,
    pub email: String,
}

impl From<Submitter> for SubmitterDto {
    fn from(s: Submitter) -> Self {
        Self {
            name: s.name,
            email: s.email,
        }
    }
}

/// Response DTO for report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: i64,
    pub tracking_id: String,
    pub title: String,
    pub region: String,
    pub location: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ReportStatus,
    pub category_id: Option<i64>,
    pub is_anonymous: bool,
    pub submitter: Option<SubmitterDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReportView> for ReportResponseDto {
    fn from(v: ReportView) -> Self {
        let r = v.report;
        Self {
            id: r.id,
            tracking_id: r.tracking_id,
            title: r.title,
            region: r.region,
            location: r.location,
            description: r.description,
            latitude: r.latitude,
            longitude: r.longitude,
            status: r.status,
            category_id: r.category_id,
            is_anonymous: r.is_anonymous,
            submitter: v.submitter.map(SubmitterDto::from),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Response DTO for report with evidence and history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportDetailResponseDto {
    #[serde(flatten)]
    pub report: ReportResponseDto,
    pub photos: Vec<EvidencePhotoResponseDto>,
    /// Newest first
    pub history: Vec<HistoryEntry>,
}

impl From<ReportDetail> for ReportDetailResponseDto {
    fn from(d: ReportDetail) -> Self {
        Self {
            report: d.view.into(),
            photos: d.photos.into_iter().map(Into::into).collect(),
            history: d.history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_dto_accepts_indonesian_aliases() {
        let dto: UpdateReportDto =
            serde_json::from_str(r#"{"wilayah": "Bantul", "lokasi": null}"#).unwrap();
        let changes: ReportChanges = dto.into();
        assert_eq!(changes.region, Patch::Value("Bantul".to_string()));
        assert_eq!(changes.location, Patch::Null);
        assert!(changes.title.is_missing());
    }

    #[test]
    fn test_report_fields_validation() {
        let fields = ReportFieldsDto {
            title: String::new(),
            region: "Sleman".to_string(),
            location: "Jl. Kaliurang".to_string(),
            description: "Rusak".to_string(),
        };
        let errors = fields.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }
}
