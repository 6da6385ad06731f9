use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

use crate::core::error::AppError;
use crate::shared::types::Patch;

/// Report lifecycle status.
///
/// The wire and storage values are the persisted Indonesian labels and must not
/// change without migrating every stored report and history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status")]
pub enum ReportStatus {
    #[serde(rename = "Diajukan")]
    #[sqlx(rename = "Diajukan")]
    Submitted,
    #[serde(rename = "Diproses")]
    #[sqlx(rename = "Diproses")]
    InProgress,
    #[serde(rename = "Selesai")]
    #[sqlx(rename = "Selesai")]
    Resolved,
    #[serde(rename = "Ditolak")]
    #[sqlx(rename = "Ditolak")]
    Rejected,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 4] = [
        ReportStatus::Submitted,
        ReportStatus::InProgress,
        ReportStatus::Resolved,
        ReportStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Submitted => "Diajukan",
            ReportStatus::InProgress => "Diproses",
            ReportStatus::Resolved => "Selesai",
            ReportStatus::Rejected => "Ditolak",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid status '{}'. Expected one of: Diajukan, Diproses, Selesai, Ditolak",
                    s
                ))
            })
    }
}

/// Database model for report
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Report {
    pub id: i64,
    pub tracking_id: String,
    pub title: String,
    pub region: String,
    pub location: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: ReportStatus,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a new report row
#[derive(Debug, Clone)]
pub struct NewReport {
    pub tracking_id: String,
    pub title: String,
    pub region: String,
    pub location: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub is_anonymous: bool,
}

/// Partial metadata update. `Patch::Missing` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ReportChanges {
    pub title: Patch<String>,
    pub region: Patch<String>,
    pub location: Patch<String>,
    pub description: Patch<String>,
    pub latitude: Patch<f64>,
    pub longitude: Patch<f64>,
    pub category_id: Patch<i64>,
}

impl ReportChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_missing()
            && self.region.is_missing()
            && self.location.is_missing()
            && self.description.is_missing()
            && self.latitude.is_missing()
            && self.longitude.is_missing()
            && self.category_id.is_missing()
    }

    /// Apply the changes to an in-memory report
    pub fn apply_to(&self, report: &mut Report) {
        fn text(patch: &Patch<String>, target: &mut String) {
            match patch {
                Patch::Missing => {}
                Patch::Null => target.clear(),
                Patch::Value(v) => *target = v.clone(),
            }
        }

        text(&self.title, &mut report.title);
        text(&self.region, &mut report.region);
        text(&self.location, &mut report.location);
        text(&self.description, &mut report.description);
        if let Patch::Value(lat) = self.latitude {
            report.latitude = lat;
        }
        if let Patch::Value(lon) = self.longitude {
            report.longitude = lon;
        }
        match self.category_id {
            Patch::Missing => {}
            Patch::Null => report.category_id = None,
            Patch::Value(id) => report.category_id = Some(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> Report {
        Report {
            id: 1,
            tracking_id: "YK2401011234".to_string(),
            title: "Jalan berlubang".to_string(),
            region: "North".to_string(),
            location: "Jl. Merdeka".to_string(),
            description: "Lubang besar".to_string(),
            latitude: -7.8,
            longitude: 110.36,
            status: ReportStatus::Submitted,
            user_id: 10,
            category_id: Some(3),
            is_anonymous: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_wire_format_is_verbatim() {
        assert_eq!(
            serde_json::to_string(&ReportStatus::InProgress).unwrap(),
            "\"Diproses\""
        );
        let parsed: ReportStatus = serde_json::from_str("\"Ditolak\"").unwrap();
        assert_eq!(parsed, ReportStatus::Rejected);
    }

    #[test]
    fn test_status_from_str_rejects_unknown() {
        assert_eq!("Selesai".parse::<ReportStatus>().unwrap(), ReportStatus::Resolved);
        assert!(matches!(
            "Resolved".parse::<ReportStatus>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_apply_changes_distinguishes_missing_and_empty() {
        let mut report = sample();
        let changes = ReportChanges {
            title: Patch::Value(String::new()),
            description: Patch::Missing,
            category_id: Patch::Null,
            latitude: Patch::Value(-6.2),
            ..Default::default()
        };
        changes.apply_to(&mut report);

        assert_eq!(report.title, "");
        assert_eq!(report.description, "Lubang besar");
        assert_eq!(report.category_id, None);
        assert_eq!(report.latitude, -6.2);
        assert_eq!(report.longitude, 110.36);
    }
}
