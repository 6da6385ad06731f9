//! Postgres backend.
//!
//! Queries are built at runtime so the crate compiles without a live database.
//! Scope filters are pushed into SQL through [`push_scope`]; every report
//! query aliases the reports table as `r`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

use super::{
    CategoryStore, EngagementStore, EvidenceStore, HistoryStore, ReportQuery, ReportStore,
    SoftDeleteStore, StatsStore, UnitOfWork, UserStore,
};
use crate::core::error::{handle_db_error, AppError, Result};
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

const REPORT_COLUMNS: &str = "r.id, r.tracking_id, r.title, r.region, r.location, r.description, \
     r.latitude, r.longitude, r.status, r.user_id, r.category_id, r.is_anonymous, \
     r.created_at, r.updated_at";

const USER_COLUMNS: &str = "id, name, email, role, is_active, created_at, deleted_at";

const PHOTO_COLUMNS: &str = "id, report_id, path, created_at, deleted_at";

const CATEGORY_COLUMNS: &str = "id, name, user_id, created_at, updated_at";

fn sql_state(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: &Scope) {
    match scope {
        Scope::Unrestricted => {
            qb.push("TRUE");
        }
        Scope::Categories(ids) => {
            qb.push("r.category_id = ANY(")
                .push_bind(ids.iter().copied().collect::<Vec<i64>>())
                .push(")");
        }
        Scope::Author(user_id) => {
            qb.push("r.user_id = ").push_bind(*user_id);
        }
        Scope::Nothing => {
            qb.push("FALSE");
        }
    }
}

fn push_list_mode(qb: &mut QueryBuilder<'_, Postgres>, mode: ListMode) {
    match mode {
        ListMode::Active => {
            qb.push(" WHERE deleted_at IS NULL");
        }
        ListMode::IncludeDeleted => {}
        ListMode::OnlyDeleted => {
            qb.push(" WHERE deleted_at IS NOT NULL");
        }
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ledger_state(&self, table: &str, id: i64) -> Result<Option<DeletionState>> {
        let row: Option<(Option<DateTime<Utc>>,)> =
            sqlx::query_as(&format!("SELECT deleted_at FROM {} WHERE id = $1", table))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| handle_db_error(e, "Failed to read deletion state"))?;
        Ok(row.map(|(deleted_at,)| deleted_at.into()))
    }

    async fn ledger_mark(&self, table: &str, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
            table
        ))
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to soft delete"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn ledger_clear(&self, table: &str, id: i64) -> Result<bool> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL",
            table
        ))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to restore"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn ledger_list<E>(&self, table: &str, columns: &str, mode: ListMode) -> Result<Vec<E>>
    where
        E: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {}", columns, table));
        push_list_mode(&mut qb, mode);
        qb.push(" ORDER BY created_at DESC, id DESC");

        qb.build_query_as::<E>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to list ledger rows"))
    }

    async fn ledger_counts(&self, table: &str) -> Result<LedgerStats> {
        sqlx::query_as::<_, LedgerStats>(&format!(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE deleted_at IS NULL) AS active,
                   COUNT(*) FILTER (WHERE deleted_at IS NOT NULL) AS deleted
            FROM {}
            "#,
            table
        ))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to count ledger rows"))
    }

    async fn scoped_count(&self, from: &str, scope: &Scope) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {} WHERE ", from));
        push_scope(&mut qb, scope);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to count records"))
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_report(&mut self, report: NewReport) -> Result<Report> {
        let result = sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO reports AS r (tracking_id, title, region, location, description,
                latitude, longitude, user_id, category_id, is_anonymous)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(&report.tracking_id)
        .bind(&report.title)
        .bind(&report.region)
        .bind(&report.location)
        .bind(&report.description)
        .bind(report.latitude)
        .bind(report.longitude)
        .bind(report.user_id)
        .bind(report.category_id)
        .bind(report.is_anonymous)
        .fetch_one(&mut *self.tx)
        .await;

        match result {
            Ok(report) => Ok(report),
            Err(e) if sql_state(&e).as_deref() == Some("23505") => {
                Err(AppError::TrackingIdTaken(report.tracking_id))
            }
            Err(e) => Err(handle_db_error(e, "Failed to insert report")),
        }
    }

    async fn insert_photo(&mut self, photo: NewEvidencePhoto) -> Result<EvidencePhoto> {
        sqlx::query_as::<_, EvidencePhoto>(&format!(
            "INSERT INTO evidence_photos (report_id, path) VALUES ($1, $2) RETURNING {}",
            PHOTO_COLUMNS
        ))
        .bind(photo.report_id)
        .bind(&photo.path)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| handle_db_error(e, "Failed to insert evidence photo"))
    }

    async fn append_history(&mut self, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        sqlx::query_as::<_, HistoryEntry>(
            r#"
            INSERT INTO report_history (report_id, status, description, recorded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, report_id, status, description, recorded_at
            "#,
        )
        .bind(entry.report_id)
        .bind(entry.status)
        .bind(&entry.description)
        .bind(entry.recorded_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| handle_db_error(e, "Failed to append report history"))
    }

    async fn set_status(&mut self, report_id: i64, status: ReportStatus) -> Result<Report> {
        sqlx::query_as::<_, Report>(&format!(
            r#"
            UPDATE reports AS r SET status = $2, updated_at = NOW()
            WHERE r.id = $1
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(report_id)
        .bind(status)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| handle_db_error(e, "Failed to update report status"))?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))
    }

    async fn insert_follow_up(&mut self, follow_up: NewFollowUp) -> Result<FollowUp> {
        sqlx::query_as::<_, FollowUp>(
            r#"
            INSERT INTO follow_ups (report_id, admin_id, description, photo_path)
            VALUES ($1, $2, $3, $4)
            RETURNING id, report_id, admin_id, description, photo_path, created_at
            "#,
        )
        .bind(follow_up.report_id)
        .bind(follow_up.admin_id)
        .bind(&follow_up.description)
        .bind(&follow_up.photo_path)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| handle_db_error(e, "Failed to insert follow-up"))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| handle_db_error(e, "Failed to commit transaction"))
    }
}

#[async_trait]
impl ReportStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| handle_db_error(e, "Failed to start transaction"))?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn find_report(&self, id: i64) -> Result<Option<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports r WHERE r.id = $1",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to fetch report"))
    }

    async fn find_report_by_tracking_id(&self, tracking_id: &str) -> Result<Option<Report>> {
        sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports r WHERE r.tracking_id = $1",
            REPORT_COLUMNS
        ))
        .bind(tracking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to fetch report by tracking id"))
    }

    async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<Report>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM reports r WHERE ",
            REPORT_COLUMNS
        ));
        push_scope(&mut qb, &query.scope);
        if let Some(from) = query.created_from {
            qb.push(" AND r.created_at >= ").push_bind(from);
        }
        if let Some(before) = query.created_before {
            qb.push(" AND r.created_at < ").push_bind(before);
        }
        qb.push(" ORDER BY r.created_at DESC, r.id DESC");
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit.max(0));
        }

        qb.build_query_as::<Report>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to list reports"))
    }

    async fn update_metadata(&self, id: i64, changes: &ReportChanges) -> Result<Report> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| handle_db_error(e, "Failed to start transaction"))?;

        let mut report = sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM reports r WHERE r.id = $1 FOR UPDATE",
            REPORT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| handle_db_error(e, "Failed to fetch report"))?
        .ok_or_else(|| AppError::NotFound(format!("Report {} not found", id)))?;

        changes.apply_to(&mut report);

        let updated = sqlx::query_as::<_, Report>(&format!(
            r#"
            UPDATE reports AS r
            SET title = $2, region = $3, location = $4, description = $5,
                latitude = $6, longitude = $7, category_id = $8, updated_at = NOW()
            WHERE r.id = $1
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(id)
        .bind(&report.title)
        .bind(&report.region)
        .bind(&report.location)
        .bind(&report.description)
        .bind(report.latitude)
        .bind(report.longitude)
        .bind(report.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| handle_db_error(e, "Failed to update report"))?;

        tx.commit()
            .await
            .map_err(|e| handle_db_error(e, "Failed to commit report update"))?;

        Ok(updated)
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn list_history(&self, report_id: i64) -> Result<Vec<HistoryEntry>> {
        sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, report_id, status, description, recorded_at
            FROM report_history
            WHERE report_id = $1
            ORDER BY recorded_at DESC, id DESC
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to list report history"))
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories ORDER BY name",
            CATEGORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to list categories"))
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to fetch category"))
    }

    async fn insert_category(&self, input: CategoryInput) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, user_id) VALUES ($1, $2) RETURNING {}",
            CATEGORY_COLUMNS
        ))
        .bind(&input.name)
        .bind(input.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match sql_state(&e).as_deref() {
            Some("23505") => AppError::Conflict(format!("Category '{}' already exists", input.name)),
            _ => handle_db_error(e, "Failed to create category"),
        })
    }

    async fn update_category(&self, id: i64, input: CategoryInput) -> Result<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories SET name = $2, user_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(input.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match sql_state(&e).as_deref() {
            Some("23505") => AppError::Conflict(format!("Category '{}' already exists", input.name)),
            _ => handle_db_error(e, "Failed to update category"),
        })?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to delete category"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }

    async fn owned_category_ids(&self, user_id: i64) -> Result<BTreeSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to fetch owned categories"))?;
        Ok(ids.into_iter().collect())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match sql_state(&e).as_deref() {
            Some("23505") => {
                AppError::Conflict(format!("Email {} is already registered", user.email))
            }
            _ => handle_db_error(e, "Failed to create user"),
        })
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to fetch user"))
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {} FROM users
            WHERE deleted_at IS NULL AND role IN ('admin', 'category_admin', 'superadmin')
            ORDER BY name
            "#,
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to list admins"))
    }

    async fn set_user_active(&self, id: i64, is_active: bool) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $2 WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to update user"))?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET name = $2, email = $3, role = $4
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(changes.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match sql_state(&e).as_deref() {
            Some("23505") => {
                AppError::Conflict(format!("Email {} is already registered", changes.email))
            }
            _ => handle_db_error(e, "Failed to update user"),
        })?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn role_counts(&self) -> Result<Vec<(Role, i64)>> {
        sqlx::query_as::<_, (Role, i64)>(
            "SELECT role, COUNT(*) FROM users WHERE deleted_at IS NULL GROUP BY role",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to count users by role"))
    }
}

#[async_trait]
impl EvidenceStore for PgStore {
    async fn find_photo(&self, id: i64) -> Result<Option<EvidencePhoto>> {
        sqlx::query_as::<_, EvidencePhoto>(&format!(
            "SELECT {} FROM evidence_photos WHERE id = $1",
            PHOTO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to fetch evidence photo"))
    }

    async fn list_report_photos(
        &self,
        report_id: i64,
        mode: ListMode,
    ) -> Result<Vec<EvidencePhoto>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM evidence_photos WHERE report_id = ",
            PHOTO_COLUMNS
        ));
        qb.push_bind(report_id);
        match mode {
            ListMode::Active => {
                qb.push(" AND deleted_at IS NULL");
            }
            ListMode::IncludeDeleted => {}
            ListMode::OnlyDeleted => {
                qb.push(" AND deleted_at IS NOT NULL");
            }
        }
        qb.push(" ORDER BY id");

        qb.build_query_as::<EvidencePhoto>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to list report photos"))
    }
}

#[async_trait]
impl EngagementStore for PgStore {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (report_id, user_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, report_id, user_id, text, created_at
            "#,
        )
        .bind(comment.report_id)
        .bind(comment.user_id)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to insert comment"))
    }

    async fn list_comments(&self, report_id: i64) -> Result<Vec<Comment>> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, report_id, user_id, text, created_at
            FROM comments
            WHERE report_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to list comments"))
    }

    async fn list_follow_ups(&self, report_id: i64) -> Result<Vec<FollowUp>> {
        sqlx::query_as::<_, FollowUp>(
            r#"
            SELECT id, report_id, admin_id, description, photo_path, created_at
            FROM follow_ups
            WHERE report_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(report_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| handle_db_error(e, "Failed to list follow-ups"))
    }
}

#[async_trait]
impl StatsStore for PgStore {
    async fn status_counts(&self, scope: &Scope) -> Result<Vec<(ReportStatus, i64)>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT r.status, COUNT(*) FROM reports r WHERE ");
        push_scope(&mut qb, scope);
        qb.push(" GROUP BY r.status");

        qb.build_query_as::<(ReportStatus, i64)>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to count reports by status"))
    }

    async fn comment_count(&self, scope: &Scope) -> Result<i64> {
        self.scoped_count("comments c JOIN reports r ON r.id = c.report_id", scope)
            .await
    }

    async fn follow_up_count(&self, scope: &Scope) -> Result<i64> {
        self.scoped_count("follow_ups f JOIN reports r ON r.id = f.report_id", scope)
            .await
    }

    async fn trend(
        &self,
        source: TrendSource,
        period: TrendPeriod,
        scope: &Scope,
        buckets: i64,
    ) -> Result<Vec<TrendPoint>> {
        let (from, column) = match source {
            TrendSource::Reports => ("reports r", "r.created_at"),
            TrendSource::Comments => ("comments c JOIN reports r ON r.id = c.report_id", "c.created_at"),
            TrendSource::FollowUps => {
                ("follow_ups f JOIN reports r ON r.id = f.report_id", "f.created_at")
            }
        };

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT to_char(date_trunc('{}', {} AT TIME ZONE 'UTC'), '{}') AS period, \
             COUNT(*) AS total FROM {} WHERE ",
            period.sql_trunc(),
            column,
            period.sql_format(),
            from
        ));
        push_scope(&mut qb, scope);
        qb.push(" GROUP BY 1 ORDER BY 1 DESC LIMIT ")
            .push_bind(buckets.max(0));

        qb.build_query_as::<TrendPoint>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to compute trend"))
    }

    async fn category_counts(&self, scope: &Scope) -> Result<Vec<CategoryCount>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT r.category_id, c.name AS category_name, COUNT(*) AS total
            FROM reports r
            LEFT JOIN categories c ON c.id = r.category_id
            WHERE "#,
        );
        push_scope(&mut qb, scope);
        qb.push(" GROUP BY r.category_id, c.name ORDER BY total DESC, r.category_id ASC NULLS LAST");

        qb.build_query_as::<CategoryCount>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to count reports by category"))
    }
}

#[async_trait]
impl SoftDeleteStore<EvidencePhoto> for PgStore {
    async fn deletion_state(&self, id: i64) -> Result<Option<DeletionState>> {
        self.ledger_state("evidence_photos", id).await
    }

    async fn mark_deleted(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        self.ledger_mark("evidence_photos", id, at).await
    }

    async fn clear_deleted(&self, id: i64) -> Result<bool> {
        self.ledger_clear("evidence_photos", id).await
    }

    async fn purge(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM evidence_photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| handle_db_error(e, "Failed to delete evidence photo"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, mode: ListMode) -> Result<Vec<EvidencePhoto>> {
        self.ledger_list("evidence_photos", PHOTO_COLUMNS, mode).await
    }

    async fn counts(&self) -> Result<LedgerStats> {
        self.ledger_counts("evidence_photos").await
    }
}

#[async_trait]
impl SoftDeleteStore<User> for PgStore {
    async fn deletion_state(&self, id: i64) -> Result<Option<DeletionState>> {
        self.ledger_state("users", id).await
    }

    async fn mark_deleted(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        self.ledger_mark("users", id, at).await
    }

    async fn clear_deleted(&self, id: i64) -> Result<bool> {
        self.ledger_clear("users", id).await
    }

    async fn purge(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match sql_state(&e).as_deref() {
                Some("23503") => AppError::Conflict(format!(
                    "User {} still owns reports, comments or follow-ups",
                    id
                )),
                _ => handle_db_error(e, "Failed to delete user"),
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, mode: ListMode) -> Result<Vec<User>> {
        self.ledger_list("users", USER_COLUMNS, mode).await
    }

    async fn counts(&self) -> Result<LedgerStats> {
        self.ledger_counts("users").await
    }
}
