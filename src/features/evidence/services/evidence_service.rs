use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::access::{Scope, ScopeResolver};
use crate::features::auth::model::Principal;
use crate::features::evidence::models::EvidencePhoto;
use crate::modules::store::{EvidenceStore, ReportStore, SoftDeleteStore};
use crate::shared::soft_delete::{LedgerStats, ListMode, SoftDeleteLedger};

/// Admin management of evidence photos, scoped by report category
pub struct EvidenceService {
    ledger: SoftDeleteLedger<EvidencePhoto>,
    photos: Arc<dyn EvidenceStore>,
    reports: Arc<dyn ReportStore>,
    scopes: Arc<ScopeResolver>,
}

impl EvidenceService {
    pub fn new<S>(store: Arc<S>, scopes: Arc<ScopeResolver>) -> Self
    where
        S: SoftDeleteStore<EvidencePhoto> + EvidenceStore + ReportStore + 'static,
    {
        Self {
            ledger: SoftDeleteLedger::<EvidencePhoto>::new(store.clone()),
            photos: store.clone(),
            reports: store,
            scopes,
        }
    }

    pub async fn list(&self, principal: &Principal, mode: ListMode) -> Result<Vec<EvidencePhoto>> {
        let scope = self.scopes.admin_scope(principal).await?;
        let photos = self.ledger.list(mode).await?;
        self.within_scope(&scope, photos).await
    }

    /// Counts cover only photos whose report is in the caller's scope
    pub async fn stats(&self, principal: &Principal) -> Result<LedgerStats> {
        let scope = self.scopes.admin_scope(principal).await?;
        if scope == Scope::Unrestricted {
            return self.ledger.stats().await;
        }

        let photos = self
            .within_scope(&scope, self.ledger.list(ListMode::IncludeDeleted).await?)
            .await?;
        let total = photos.len() as i64;
        let deleted = photos.iter().filter(|p| p.deleted_at.is_some()).count() as i64;
        Ok(LedgerStats {
            total,
            active: total - deleted,
            deleted,
        })
    }

    async fn within_scope(
        &self,
        scope: &Scope,
        photos: Vec<EvidencePhoto>,
    ) -> Result<Vec<EvidencePhoto>> {
        if *scope == Scope::Unrestricted {
            return Ok(photos);
        }

        let mut visible: BTreeMap<i64, bool> = BTreeMap::new();
        let mut result = Vec::with_capacity(photos.len());
        for photo in photos {
            let permitted = match visible.get(&photo.report_id) {
                Some(permitted) => *permitted,
                None => {
                    let permitted = self
                        .reports
                        .find_report(photo.report_id)
                        .await?
                        .is_some_and(|r| scope.permits(&r));
                    visible.insert(photo.report_id, permitted);
                    permitted
                }
            };
            if permitted {
                result.push(photo);
            }
        }
        Ok(result)
    }

    pub async fn soft_delete(&self, principal: &Principal, photo_id: i64) -> Result<()> {
        self.authorize(principal, photo_id).await?;
        self.ledger.soft_delete(photo_id).await
    }

    pub async fn restore(&self, principal: &Principal, photo_id: i64) -> Result<()> {
        self.authorize(principal, photo_id).await?;
        self.ledger.restore(photo_id).await
    }

    pub async fn hard_delete(&self, principal: &Principal, photo_id: i64) -> Result<()> {
        self.authorize(principal, photo_id).await?;
        self.ledger.hard_delete(photo_id).await
    }

    /// The photo must exist in any state and its report must be in scope
    async fn authorize(&self, principal: &Principal, photo_id: i64) -> Result<()> {
        let photo = self
            .photos
            .find_photo(photo_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Evidence photo {} not found", photo_id)))?;
        let report = self
            .reports
            .find_report(photo.report_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", photo.report_id)))?;
        self.scopes.authorize_report(principal, &report).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::EmptyScopePolicy;
    use crate::features::auth::model::Role;
    use crate::features::categories::models::CategoryInput;
    use crate::features::evidence::models::NewEvidencePhoto;
    use crate::modules::store::{CategoryStore, MemoryStore, UnitOfWork};
    use crate::shared::test_helpers::{new_report, principal, seed_user};

    struct Fixture {
        service: EvidenceService,
        photo_ids: Vec<i64>,
        roads_admin: Principal,
        water_admin: Principal,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let owner = seed_user(&store, Role::Citizen).await;
        let roads_owner = seed_user(&store, Role::CategoryAdmin).await;
        let water_owner = seed_user(&store, Role::CategoryAdmin).await;

        let roads = store
            .insert_category(CategoryInput {
                name: "Jalan".to_string(),
                user_id: Some(roads_owner.id),
            })
            .await
            .unwrap();
        store
            .insert_category(CategoryInput {
                name: "Air".to_string(),
                user_id: Some(water_owner.id),
            })
            .await
            .unwrap();

        let mut uow = store.begin().await.unwrap();
        let mut new = new_report(owner.id, "YK2401011111");
        new.category_id = Some(roads.id);
        let report = uow.insert_report(new).await.unwrap();
        let mut photo_ids = Vec::new();
        for i in 0..3 {
            let photo = uow
                .insert_photo(NewEvidencePhoto {
                    report_id: report.id,
                    path: format!("evidence/20240101000000_{}.jpg", i),
                })
                .await
                .unwrap();
            photo_ids.push(photo.id);
        }
        uow.commit().await.unwrap();

        let scopes = Arc::new(ScopeResolver::new(store.clone(), EmptyScopePolicy::Unrestricted));
        Fixture {
            service: EvidenceService::new(store, scopes),
            photo_ids,
            roads_admin: principal(roads_owner.id, Role::CategoryAdmin),
            water_admin: principal(water_owner.id, Role::CategoryAdmin),
        }
    }

    #[tokio::test]
    async fn test_stats_invariant_through_lifecycle() {
        let f = fixture().await;
        let admin = &f.roads_admin;

        tokio_test::assert_ok!(f.service.soft_delete(admin, f.photo_ids[0]).await);
        tokio_test::assert_ok!(f.service.soft_delete(admin, f.photo_ids[1]).await);
        tokio_test::assert_err!(f.service.soft_delete(admin, f.photo_ids[1]).await);
        f.service.restore(admin, f.photo_ids[1]).await.unwrap();
        f.service.hard_delete(admin, f.photo_ids[0]).await.unwrap();
        f.service.hard_delete(admin, f.photo_ids[2]).await.unwrap();

        let stats = f.service.stats(admin).await.unwrap();
        assert_eq!(stats.total, stats.active + stats.deleted);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.active, 1);

        assert!(matches!(
            f.service.restore(admin, f.photo_ids[0]).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_scope_admin_is_forbidden() {
        let f = fixture().await;

        let result = f.service.soft_delete(&f.water_admin, f.photo_ids[0]).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let visible = f
            .service
            .list(&f.water_admin, ListMode::IncludeDeleted)
            .await
            .unwrap();
        assert!(visible.is_empty());

        let visible = f.service.list(&f.roads_admin, ListMode::Active).await.unwrap();
        assert_eq!(visible.len(), 3);
    }

    #[tokio::test]
    async fn test_stats_follow_scope() {
        let f = fixture().await;
        f.service
            .soft_delete(&f.roads_admin, f.photo_ids[0])
            .await
            .unwrap();

        let stats = f.service.stats(&f.roads_admin).await.unwrap();
        assert_eq!((stats.total, stats.active, stats.deleted), (3, 2, 1));

        let stats = f.service.stats(&f.water_admin).await.unwrap();
        assert_eq!((stats.total, stats.active, stats.deleted), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_only_deleted_listing() {
        let f = fixture().await;
        f.service
            .soft_delete(&f.roads_admin, f.photo_ids[2])
            .await
            .unwrap();

        let deleted = f
            .service
            .list(&f.roads_admin, ListMode::OnlyDeleted)
            .await
            .unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].id, f.photo_ids[2]);
        assert!(deleted[0].deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_citizen_cannot_manage_evidence() {
        let f = fixture().await;
        let citizen = principal(1, Role::Citizen);
        assert!(matches!(
            f.service.stats(&citizen).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
