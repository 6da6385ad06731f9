//! Two-tier delete lifecycle shared by evidence photos and user accounts.
//!
//! A soft delete only sets a marker, so the row stays in storage and can be
//! restored. A hard delete removes the row for good. Entity classes plug in
//! through [`SoftDeleteStore`].

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::modules::store::SoftDeleteStore;

/// Which rows a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    #[default]
    Active,
    IncludeDeleted,
    OnlyDeleted,
}

impl ListMode {
    /// Build from explicit query flags. `only_deleted` wins over `include_deleted`.
    pub fn from_flags(include_deleted: bool, only_deleted: bool) -> Self {
        if only_deleted {
            ListMode::OnlyDeleted
        } else if include_deleted {
            ListMode::IncludeDeleted
        } else {
            ListMode::Active
        }
    }

    pub fn admits(&self, deleted_at: Option<DateTime<Utc>>) -> bool {
        match self {
            ListMode::Active => deleted_at.is_none(),
            ListMode::IncludeDeleted => true,
            ListMode::OnlyDeleted => deleted_at.is_some(),
        }
    }
}

/// Current deletion marker of a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionState {
    Active,
    Deleted(DateTime<Utc>),
}

impl From<Option<DateTime<Utc>>> for DeletionState {
    fn from(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => DeletionState::Deleted(at),
            None => DeletionState::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LedgerStats {
    pub total: i64,
    pub active: i64,
    pub deleted: i64,
}

/// Human readable entity name used in error messages
pub trait LedgerEntity: Send + Sync + 'static {
    const LABEL: &'static str;
}

pub struct SoftDeleteLedger<E: LedgerEntity> {
    store: Arc<dyn SoftDeleteStore<E>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: LedgerEntity> SoftDeleteLedger<E> {
    pub fn new(store: Arc<dyn SoftDeleteStore<E>>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        match self.store.deletion_state(id).await? {
            None => return Err(not_found::<E>(id)),
            Some(DeletionState::Deleted(_)) => return Err(already_deleted::<E>(id)),
            Some(DeletionState::Active) => {}
        }

        // A concurrent delete can win between the read and the write
        if !self.store.mark_deleted(id, Utc::now()).await? {
            return Err(already_deleted::<E>(id));
        }

        tracing::info!("Soft deleted {} {}", E::LABEL, id);
        Ok(())
    }

    pub async fn restore(&self, id: i64) -> Result<()> {
        if !self.store.clear_deleted(id).await? {
            return Err(AppError::NotFound(format!(
                "No deleted {} with id {}",
                E::LABEL,
                id
            )));
        }

        tracing::info!("Restored {} {}", E::LABEL, id);
        Ok(())
    }

    pub async fn hard_delete(&self, id: i64) -> Result<()> {
        if !self.store.purge(id).await? {
            return Err(not_found::<E>(id));
        }

        tracing::warn!("Permanently deleted {} {}", E::LABEL, id);
        Ok(())
    }

    pub async fn list(&self, mode: ListMode) -> Result<Vec<E>> {
        self.store.list(mode).await
    }

    pub async fn stats(&self) -> Result<LedgerStats> {
        self.store.counts().await
    }
}

fn not_found<E: LedgerEntity>(id: i64) -> AppError {
    AppError::NotFound(format!("{} {} not found", E::LABEL, id))
}

fn already_deleted<E: LedgerEntity>(id: i64) -> AppError {
    AppError::Conflict(format!("{} {} is already deleted", E::LABEL, id))
}
