use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::evidence::models::EvidencePhoto;
use crate::shared::soft_delete::ListMode;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvidencePhotoResponseDto {
    pub id: i64,
    pub report_id: i64,
    /// Storage key of the photo
    pub path: String,
    pub created_at: DateTime<Utc>,
    /// Set when the photo is soft-deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<EvidencePhoto> for EvidencePhotoResponseDto {
    fn from(p: EvidencePhoto) -> Self {
        Self {
            id: p.id,
            report_id: p.report_id,
            path: p.path,
            created_at: p.created_at,
            deleted_at: p.deleted_at,
        }
    }
}

/// Soft-delete listing flags shared by the evidence and user listings
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LedgerListQuery {
    /// Include soft-deleted rows
    #[serde(default)]
    pub include_deleted: bool,
    /// Only soft-deleted rows; wins over `include_deleted`
    #[serde(default)]
    pub only_deleted: bool,
}

impl LedgerListQuery {
    pub fn mode(&self) -> ListMode {
        ListMode::from_flags(self.include_deleted, self.only_deleted)
    }
}
