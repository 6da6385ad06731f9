//! Append-only status history.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::status_template::render_status_description;
use crate::core::error::Result;
use crate::features::reports::models::{HistoryEntry, NewHistoryEntry, Report, ReportStatus};
use crate::modules::store::{HistoryStore, UnitOfWork};

pub struct AuditTrail {
    history: Arc<dyn HistoryStore>,
}

impl AuditTrail {
    pub fn new(history: Arc<dyn HistoryStore>) -> Self {
        Self { history }
    }

    /// Append an entry inside `uow`. A blank description falls back to the
    /// status template for the report's region.
    pub async fn append(
        &self,
        uow: &mut dyn UnitOfWork,
        report: &Report,
        status: ReportStatus,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<HistoryEntry> {
        let description = match description.map(str::trim).filter(|d| !d.is_empty()) {
            Some(text) => text.to_string(),
            None => render_status_description(status, &report.region)?,
        };

        uow.append_history(NewHistoryEntry {
            report_id: report.id,
            status,
            description,
            recorded_at: at,
        })
        .await
    }

    /// Newest first
    pub async fn list(&self, report_id: i64) -> Result<Vec<HistoryEntry>> {
        self.history.list_history(report_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::Role;
    use crate::modules::store::{MemoryStore, ReportStore};
    use crate::shared::test_helpers::{new_report, seed_user};

    #[tokio::test]
    async fn test_appends_without_deduplication() {
        let store = Arc::new(MemoryStore::new());
        let trail = AuditTrail::new(store.clone());
        let owner = seed_user(&store, Role::Citizen).await;

        let mut uow = store.begin().await.unwrap();
        let report = uow
            .insert_report(new_report(owner.id, "YK2401011234"))
            .await
            .unwrap();
        for _ in 0..2 {
            trail
                .append(uow.as_mut(), &report, ReportStatus::InProgress, None, Utc::now())
                .await
                .unwrap();
        }
        trail
            .append(
                uow.as_mut(),
                &report,
                ReportStatus::Resolved,
                Some("  Sudah diperbaiki  "),
                Utc::now(),
            )
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let entries = trail.list(report.id).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].status, ReportStatus::Resolved);
        assert_eq!(entries[0].description, "Sudah diperbaiki");
        assert!(entries[1].description.contains("Sleman"));
    }
}
