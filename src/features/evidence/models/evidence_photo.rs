use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::shared::soft_delete::LedgerEntity;

/// Database model for an evidence photo attached to a report
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct EvidencePhoto {
    pub id: i64,
    pub report_id: i64,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewEvidencePhoto {
    pub report_id: i64,
    pub path: String,
}

impl LedgerEntity for EvidencePhoto {
    const LABEL: &'static str = "Evidence photo";
}
