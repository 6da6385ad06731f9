//! Process-local store backed by ordered maps.
//!
//! Used by the test suite and by `STORE_BACKEND=memory`. It enforces the same
//! uniqueness and reference rules as the Postgres schema. A unit of work holds
//! the write lock and mutates a staged copy that replaces the live state on
//! commit.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use super::{
    CategoryStore, EngagementStore, EvidenceStore, HistoryStore, ReportQuery, ReportStore,
    SoftDeleteStore, StatsStore, UnitOfWork, UserStore,
};
use crate::core::error::{AppError, Result};
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

#[derive(Debug, Clone, Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    reports: BTreeMap<i64, Report>,
    history: Vec<HistoryEntry>,
    photos: BTreeMap<i64, EvidencePhoto>,
    comments: Vec<Comment>,
    follow_ups: Vec<FollowUp>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn require_report(&self, id: i64) -> Result<&Report> {
        self.reports
            .get(&id)
            .ok_or_else(|| AppError::Validation(format!("Report {} does not exist", id)))
    }

    fn require_user(&self, id: i64) -> Result<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| AppError::Validation(format!("User {} does not exist", id)))
    }

    fn require_category(&self, id: i64) -> Result<&Category> {
        self.categories
            .get(&id)
            .ok_or_else(|| AppError::Validation(format!("Category {} does not exist", id)))
    }

    fn insert_report(&mut self, new: NewReport) -> Result<Report> {
        self.require_user(new.user_id)?;
        if let Some(category_id) = new.category_id {
            self.require_category(category_id)?;
        }
        if self
            .reports
            .values()
            .any(|r| r.tracking_id == new.tracking_id)
        {
            return Err(AppError::TrackingIdTaken(new.tracking_id));
        }

        let now = Utc::now();
        let report = Report {
            id: self.next_id(),
            tracking_id: new.tracking_id,
            title: new.title,
            region: new.region,
            location: new.location,
            description: new.description,
            latitude: new.latitude,
            longitude: new.longitude,
            status: ReportStatus::Submitted,
            user_id: new.user_id,
            category_id: new.category_id,
            is_anonymous: new.is_anonymous,
            created_at: now,
            updated_at: now,
        };
        self.reports.insert(report.id, report.clone());
        Ok(report)
    }

    fn insert_photo(&mut self, new: NewEvidencePhoto) -> Result<EvidencePhoto> {
        self.require_report(new.report_id)?;
        let photo = EvidencePhoto {
            id: self.next_id(),
            report_id: new.report_id,
            path: new.path,
            created_at: Utc::now(),
            deleted_at: None,
        };
        self.photos.insert(photo.id, photo.clone());
        Ok(photo)
    }

    fn append_history(&mut self, new: NewHistoryEntry) -> Result<HistoryEntry> {
        self.require_report(new.report_id)?;
        let entry = HistoryEntry {
            id: self.next_id(),
            report_id: new.report_id,
            status: new.status,
            description: new.description,
            recorded_at: new.recorded_at,
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    fn set_status(&mut self, report_id: i64, status: ReportStatus) -> Result<Report> {
        let report = self
            .reports
            .get_mut(&report_id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;
        report.status = status;
        report.updated_at = Utc::now();
        Ok(report.clone())
    }

    fn insert_follow_up(&mut self, new: NewFollowUp) -> Result<FollowUp> {
        self.require_report(new.report_id)?;
        self.require_user(new.admin_id)?;
        let follow_up = FollowUp {
            id: self.next_id(),
            report_id: new.report_id,
            admin_id: new.admin_id,
            description: new.description,
            photo_path: new.photo_path,
            created_at: Utc::now(),
        };
        self.follow_ups.push(follow_up.clone());
        Ok(follow_up)
    }

    fn report_in_scope(&self, report_id: i64, scope: &Scope) -> bool {
        self.reports
            .get(&report_id)
            .is_some_and(|report| scope.permits(report))
    }

    fn ensure_unique_category_name(&self, name: &str, except: Option<i64>) -> Result<()> {
        let taken = self
            .categories
            .values()
            .any(|c| c.name == name && Some(c.id) != except);
        if taken {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }
        Ok(())
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    items.sort_by_key(|item| Reverse(key(item)));
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

struct MemoryUnitOfWork {
    guard: OwnedRwLockWriteGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_report(&mut self, report: NewReport) -> Result<Report> {
        self.staged.insert_report(report)
    }

    async fn insert_photo(&mut self, photo: NewEvidencePhoto) -> Result<EvidencePhoto> {
        self.staged.insert_photo(photo)
    }

    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        self.staged.append_history(entry)
    }

    async fn set_status(&mut self, report_id: i64, status: ReportStatus) -> Result<Report> {
        self.staged.set_status(report_id, status)
    }

    async fn insert_follow_up(&mut self, follow_up: NewFollowUp) -> Result<FollowUp> {
        self.staged.insert_follow_up(follow_up)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.state).write_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }

    async fn find_report(&self, id: i64) -> Result<Option<Report>> {
        Ok(self.state.read().await.reports.get(&id).cloned())
    }

    async fn find_report_by_tracking_id(&self, tracking_id: &str) -> Result<Option<Report>> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .values()
            .find(|r| r.tracking_id == tracking_id)
            .cloned())
    }

    async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<Report>> {
        let state = self.state.read().await;
        let mut reports: Vec<Report> = state
            .reports
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        newest_first(&mut reports, |r| (r.created_at, r.id));
        if let Some(limit) = query.limit {
            reports.truncate(limit.max(0) as usize);
        }
        Ok(reports)
    }

    async fn update_metadata(&self, id: i64, changes: &ReportChanges) -> Result<Report> {
        let mut state = self.state.write().await;
        if let crate::shared::types::Patch::Value(category_id) = changes.category_id {
            state.require_category(category_id)?;
        }
        let report = state
            .reports
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;
        changes.apply_to(report);
        report.updated_at = Utc::now();
        Ok(report.clone())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn list_history(&self, report_id: i64) -> Result<Vec<HistoryEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .filter(|h| h.report_id == report_id)
            .cloned()
            .collect();
        newest_first(&mut entries, |h| (h.recorded_at, h.id));
        Ok(entries)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, input: CategoryInput) -> Result<Category> {
        let mut state = self.state.write().await;
        state.ensure_unique_category_name(&input.name, None)?;
        if let Some(owner) = input.user_id {
            state.require_user(owner)?;
        }

        let now = Utc::now();
        let category = Category {
            id: state.next_id(),
            name: input.name,
            user_id: input.user_id,
            created_at: now,
            updated_at: now,
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, input: CategoryInput) -> Result<Category> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&id) {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        state.ensure_unique_category_name(&input.name, Some(id))?;
        if let Some(owner) = input.user_id {
            state.require_user(owner)?;
        }

        let category = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;
        category.name = input.name;
        category.user_id = input.user_id;
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if state.categories.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        for report in state.reports.values_mut() {
            if report.category_id == Some(id) {
                report.category_id = None;
            }
        }
        Ok(())
    }

    async fn owned_category_ids(&self, user_id: i64) -> Result<BTreeSet<i64>> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.user_id == Some(user_id))
            .map(|c| c.id)
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                user.email
            )));
        }

        let user = User {
            id: state.next_id(),
            name: user.name,
            email: user.email,
            role: user.role,
            is_active: true,
            created_at: Utc::now(),
            deleted_at: None,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut admins: Vec<User> = state
            .users
            .values()
            .filter(|u| u.deleted_at.is_none() && u.role.is_admin_tier())
            .cloned()
            .collect();
        admins.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(admins)
    }

    async fn set_user_active(&self, id: i64, is_active: bool) -> Result<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.is_active = is_active;
        Ok(user.clone())
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.id != id && u.email == changes.email)
        {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                changes.email
            )));
        }

        let user = state
            .users
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        user.name = changes.name;
        user.email = changes.email;
        user.role = changes.role;
        Ok(user.clone())
    }

    async fn role_counts(&self) -> Result<Vec<(Role, i64)>> {
        let state = self.state.read().await;
        let mut counts: Vec<(Role, i64)> = Vec::new();
        for user in state.users.values().filter(|u| u.deleted_at.is_none()) {
            match counts.iter_mut().find(|(role, _)| *role == user.role) {
                Some((_, total)) => *total += 1,
                None => counts.push((user.role, 1)),
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl EvidenceStore for MemoryStore {
    async fn find_photo(&self, id: i64) -> Result<Option<EvidencePhoto>> {
        Ok(self.state.read().await.photos.get(&id).cloned())
    }

    async fn list_report_photos(
        &self,
        report_id: i64,
        mode: ListMode,
    ) -> Result<Vec<EvidencePhoto>> {
        let state = self.state.read().await;
        Ok(state
            .photos
            .values()
            .filter(|p| p.report_id == report_id && mode.admits(p.deleted_at))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EngagementStore for MemoryStore {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        let mut state = self.state.write().await;
        state.require_report(comment.report_id)?;
        state.require_user(comment.user_id)?;

        let comment = Comment {
            id: state.next_id(),
            report_id: comment.report_id,
            user_id: comment.user_id,
            text: comment.text,
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, report_id: i64) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.report_id == report_id)
            .cloned()
            .collect();
        newest_first(&mut comments, |c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn list_follow_ups(&self, report_id: i64) -> Result<Vec<FollowUp>> {
        let state = self.state.read().await;
        let mut follow_ups: Vec<FollowUp> = state
            .follow_ups
            .iter()
            .filter(|f| f.report_id == report_id)
            .cloned()
            .collect();
        newest_first(&mut follow_ups, |f| (f.created_at, f.id));
        Ok(follow_ups)
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn status_counts(&self, scope: &Scope) -> Result<Vec<(ReportStatus, i64)>> {
        let state = self.state.read().await;
        let counts = ReportStatus::ALL
            .into_iter()
            .map(|status| {
                let total = state
                    .reports
                    .values()
                    .filter(|r| r.status == status && scope.permits(r))
                    .count() as i64;
                (status, total)
            })
            .filter(|(_, total)| *total > 0)
            .collect();
        Ok(counts)
    }

    async fn comment_count(&self, scope: &Scope) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| state.report_in_scope(c.report_id, scope))
            .count() as i64)
    }

    async fn follow_up_count(&self, scope: &Scope) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .follow_ups
            .iter()
            .filter(|f| state.report_in_scope(f.report_id, scope))
            .count() as i64)
    }

    async fn trend(
        &self,
        source: TrendSource,
        period: TrendPeriod,
        scope: &Scope,
        buckets: i64,
    ) -> Result<Vec<TrendPoint>> {
        let state = self.state.read().await;
        let timestamps: Vec<DateTime<Utc>> = match source {
            TrendSource::Reports => state
                .reports
                .values()
                .filter(|r| scope.permits(r))
                .map(|r| r.created_at)
                .collect(),
            TrendSource::Comments => state
                .comments
                .iter()
                .filter(|c| state.report_in_scope(c.report_id, scope))
                .map(|c| c.created_at)
                .collect(),
            TrendSource::FollowUps => state
                .follow_ups
                .iter()
                .filter(|f| state.report_in_scope(f.report_id, scope))
                .map(|f| f.created_at)
                .collect(),
        };

        let mut grouped: BTreeMap<String, i64> = BTreeMap::new();
        for at in timestamps {
            *grouped.entry(period.label(at)).or_default() += 1;
        }

        Ok(grouped
            .into_iter()
            .rev()
            .take(buckets.max(0) as usize)
            .map(|(period, total)| TrendPoint { period, total })
            .collect())
    }

    async fn category_counts(&self, scope: &Scope) -> Result<Vec<CategoryCount>> {
        let state = self.state.read().await;
        let mut grouped: BTreeMap<Option<i64>, i64> = BTreeMap::new();
        for report in state.reports.values().filter(|r| scope.permits(r)) {
            *grouped.entry(report.category_id).or_default() += 1;
        }

        let mut counts: Vec<CategoryCount> = grouped
            .into_iter()
            .map(|(category_id, total)| CategoryCount {
                category_id,
                category_name: category_id
                    .and_then(|id| state.categories.get(&id))
                    .map(|c| c.name.clone()),
                total,
            })
            .collect();
        counts.sort_by_key(|c| (Reverse(c.total), c.category_id.is_none(), c.category_id));
        Ok(counts)
    }
}

#[async_trait]
impl SoftDeleteStore<EvidencePhoto> for MemoryStore {
    async fn deletion_state(&self, id: i64) -> Result<Option<DeletionState>> {
        let state = self.state.read().await;
        Ok(state.photos.get(&id).map(|p| p.deleted_at.into()))
    }

    async fn mark_deleted(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.photos.get_mut(&id) {
            Some(photo) if photo.deleted_at.is_none() => {
                photo.deleted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_deleted(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.photos.get_mut(&id) {
            Some(photo) if photo.deleted_at.is_some() => {
                photo.deleted_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge(&self, id: i64) -> Result<bool> {
        Ok(self.state.write().await.photos.remove(&id).is_some())
    }

    async fn list(&self, mode: ListMode) -> Result<Vec<EvidencePhoto>> {
        let state = self.state.read().await;
        let mut photos: Vec<EvidencePhoto> = state
            .photos
            .values()
            .filter(|p| mode.admits(p.deleted_at))
            .cloned()
            .collect();
        newest_first(&mut photos, |p| (p.created_at, p.id));
        Ok(photos)
    }

    async fn counts(&self) -> Result<LedgerStats> {
        let state = self.state.read().await;
        let total = state.photos.len() as i64;
        let deleted = state
            .photos
            .values()
            .filter(|p| p.deleted_at.is_some())
            .count() as i64;
        Ok(LedgerStats {
            total,
            active: total - deleted,
            deleted,
        })
    }
}

#[async_trait]
impl SoftDeleteStore<User> for MemoryStore {
    async fn deletion_state(&self, id: i64) -> Result<Option<DeletionState>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|u| u.deleted_at.into()))
    }

    async fn mark_deleted(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&id) {
            Some(user) if user.deleted_at.is_none() => {
                user.deleted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_deleted(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&id) {
            Some(user) if user.deleted_at.is_some() => {
                user.deleted_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Ok(false);
        }

        let referenced = state.reports.values().any(|r| r.user_id == id)
            || state.comments.iter().any(|c| c.user_id == id)
            || state.follow_ups.iter().any(|f| f.admin_id == id);
        if referenced {
            return Err(AppError::Conflict(format!(
                "User {} still owns reports, comments or follow-ups",
                id
            )));
        }

        for category in state.categories.values_mut() {
            if category.user_id == Some(id) {
                category.user_id = None;
            }
        }
        state.users.remove(&id);
        Ok(true)
    }

    async fn list(&self, mode: ListMode) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| mode.admits(u.deleted_at))
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created_at, u.id));
        Ok(users)
    }

    async fn counts(&self) -> Result<LedgerStats> {
        let state = self.state.read().await;
        let total = state.users.len() as i64;
        let deleted = state
            .users
            .values()
            .filter(|u| u.deleted_at.is_some())
            .count() as i64;
        Ok(LedgerStats {
            total,
            active: total - deleted,
            deleted,
        })
    }
}
