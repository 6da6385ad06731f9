//! Persistence interfaces.
//!
//! Each service depends only on the narrow trait it needs. Both [`PgStore`]
//! and [`MemoryStore`] implement every trait, so the backend is chosen once at
//! startup. Multi-row writes go through a [`UnitOfWork`] obtained from
//! [`ReportStore::begin`]; dropping it without `commit` discards every write.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::error::Result;
use crate::features::access::Scope;
use crate::features::auth::model::Role;
use crate::features::categories::models::{Category, CategoryInput};
use crate::features::dashboard::models::{CategoryCount, TrendPeriod, TrendPoint, TrendSource};
use crate::features::engagement::models::{Comment, FollowUp, NewComment, NewFollowUp};
use crate::features::evidence::models::{EvidencePhoto, NewEvidencePhoto};
use crate::features::reports::models::{
    HistoryEntry, NewHistoryEntry, NewReport, Report, ReportChanges, ReportStatus,
};
use crate::features::users::models::{NewUser, User, UserChanges};
use crate::shared::soft_delete::{DeletionState, LedgerStats, ListMode};

/// Report listing filter
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub scope: Scope,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl ReportQuery {
    pub fn scoped(scope: Scope) -> Self {
        Self {
            scope,
            created_from: None,
            created_before: None,
            limit: None,
        }
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.scope.permits(report)
            && self.created_from.is_none_or(|from| report.created_at >= from)
            && self
                .created_before
                .is_none_or(|before| report.created_at < before)
    }
}

/// Atomic group of writes.
///
/// `insert_report` fails with `AppError::TrackingIdTaken` when the tracking id
/// already exists. The unit of work must then be dropped.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert_report(&mut self, report: NewReport) -> Result<Report>;
    async fn insert_photo(&mut self, photo: NewEvidencePhoto) -> Result<EvidencePhoto>;
    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry>;
    async fn set_status(&mut self, report_id: i64, status: ReportStatus) -> Result<Report>;
    async fn insert_follow_up(&mut self, follow_up: NewFollowUp) -> Result<FollowUp>;
    async fn commit(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
    async fn find_report(&self, id: i64) -> Result<Option<Report>>;
    async fn find_report_by_tracking_id(&self, tracking_id: &str) -> Result<Option<Report>>;
    /// Newest first
    async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<Report>>;
    async fn update_metadata(&self, id: i64, changes: &ReportChanges) -> Result<Report>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Newest first
    async fn list_history(&self, report_id: i64) -> Result<Vec<HistoryEntry>>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn find_category(&self, id: i64) -> Result<Option<Category>>;
    /// Fails with `Conflict` on a duplicate name
    async fn insert_category(&self, input: CategoryInput) -> Result<Category>;
    async fn update_category(&self, id: i64, input: CategoryInput) -> Result<Category>;
    /// Reports in the category become uncategorised
    async fn delete_category(&self, id: i64) -> Result<()>;
    async fn owned_category_ids(&self, user_id: i64) -> Result<BTreeSet<i64>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` on a duplicate email
    async fn insert_user(&self, user: NewUser) -> Result<User>;
    /// Returns live and soft-deleted accounts
    async fn find_user(&self, id: i64) -> Result<Option<User>>;
    async fn list_admins(&self) -> Result<Vec<User>>;
    /// Only live accounts can be toggled
    async fn set_user_active(&self, id: i64, is_active: bool) -> Result<User>;
    /// Only live accounts can be edited. Fails with `Conflict` on a duplicate email
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User>;
    async fn role_counts(&self) -> Result<Vec<(Role, i64)>>;
}

#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Returns live and soft-deleted photos
    async fn find_photo(&self, id: i64) -> Result<Option<EvidencePhoto>>;
    async fn list_report_photos(&self, report_id: i64, mode: ListMode)
        -> Result<Vec<EvidencePhoto>>;
}

#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment>;
    /// Newest first
    async fn list_comments(&self, report_id: i64) -> Result<Vec<Comment>>;
    /// Newest first
    async fn list_follow_ups(&self, report_id: i64) -> Result<Vec<FollowUp>>;
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn status_counts(&self, scope: &Scope) -> Result<Vec<(ReportStatus, i64)>>;
    async fn comment_count(&self, scope: &Scope) -> Result<i64>;
    async fn follow_up_count(&self, scope: &Scope) -> Result<i64>;
    /// Most recent buckets first
    async fn trend(
        &self,
        source: TrendSource,
        period: TrendPeriod,
        scope: &Scope,
        buckets: i64,
    ) -> Result<Vec<TrendPoint>>;
    async fn category_counts(&self, scope: &Scope) -> Result<Vec<CategoryCount>>;
}

/// Storage side of the soft-delete ledger for one entity class
#[async_trait]
pub trait SoftDeleteStore<E>: Send + Sync {
    /// `None` when no row with this id exists in any state
    async fn deletion_state(&self, id: i64) -> Result<Option<DeletionState>>;
    /// Returns false when no live row was marked
    async fn mark_deleted(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;
    /// Returns false when no soft-deleted row was cleared
    async fn clear_deleted(&self, id: i64) -> Result<bool>;
    /// Returns false when no row was removed
    async fn purge(&self, id: i64) -> Result<bool>;
    async fn list(&self, mode: ListMode) -> Result<Vec<E>>;
    async fn counts(&self) -> Result<LedgerStats>;
}
