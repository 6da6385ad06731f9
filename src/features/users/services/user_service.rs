use std::sync::Arc;

use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::access::ScopeResolver;
use crate::features::auth::model::{Principal, Role};
use crate::features::users::dtos::{RoleCountDto, UserStatsDto};
use crate::features::users::models::{NewUser, User, UserChanges, UserUpdate};
use crate::modules::store::{CategoryStore, SoftDeleteStore, UserStore};
use crate::shared::soft_delete::{ListMode, SoftDeleteLedger};

/// Account administration on top of the soft-delete ledger.
///
/// Listing, editing, soft delete, restore and activation are open to
/// unrestricted admins. Permanent removal is reserved for superadmins.
pub struct UserService {
    ledger: SoftDeleteLedger<User>,
    users: Arc<dyn UserStore>,
    categories: Arc<dyn CategoryStore>,
    scopes: Arc<ScopeResolver>,
}

impl UserService {
    pub fn new<S>(store: Arc<S>, scopes: Arc<ScopeResolver>) -> Self
    where
        S: SoftDeleteStore<User> + UserStore + CategoryStore + 'static,
    {
        Self {
            ledger: SoftDeleteLedger::<User>::new(store.clone()),
            users: store.clone(),
            categories: store,
            scopes,
        }
    }

    pub async fn create(&self, principal: &Principal, user: NewUser) -> Result<User> {
        if !principal.is_superadmin() {
            return Err(AppError::Forbidden(
                "Superadmin access required".to_string(),
            ));
        }
        let user = self.users.insert_user(user).await?;
        info!("User {} registered with role {}", user.id, user.role);
        Ok(user)
    }

    pub async fn list(&self, principal: &Principal, mode: ListMode) -> Result<Vec<User>> {
        self.scopes.require_unrestricted_admin(principal).await?;
        self.ledger.list(mode).await
    }

    /// Soft-deleted accounts are returned too, with `deleted_at` set
    pub async fn get(&self, principal: &Principal, id: i64) -> Result<User> {
        self.scopes.require_unrestricted_admin(principal).await?;
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn stats(&self, principal: &Principal) -> Result<UserStatsDto> {
        self.scopes.require_unrestricted_admin(principal).await?;
        let ledger = self.ledger.stats().await?;

        let mut by_role: Vec<RoleCountDto> = self
            .users
            .role_counts()
            .await?
            .into_iter()
            .map(|(role, total)| RoleCountDto { role, total })
            .collect();
        by_role.sort_by_key(|c| c.role.as_str());

        Ok(UserStatsDto { ledger, by_role })
    }

    pub async fn soft_delete(&self, principal: &Principal, id: i64) -> Result<()> {
        self.scopes.require_unrestricted_admin(principal).await?;
        reject_self(principal, id)?;
        self.ledger.soft_delete(id).await
    }

    pub async fn restore(&self, principal: &Principal, id: i64) -> Result<()> {
        self.scopes.require_unrestricted_admin(principal).await?;
        self.ledger.restore(id).await
    }

    /// Fails with `Conflict` while the account still authors reports, comments or follow-ups
    pub async fn hard_delete(&self, principal: &Principal, id: i64) -> Result<()> {
        if !principal.is_superadmin() {
            return Err(AppError::Forbidden(
                "Only a superadmin may permanently delete users".to_string(),
            ));
        }
        reject_self(principal, id)?;
        self.ledger.hard_delete(id).await
    }

    pub async fn toggle_active(&self, principal: &Principal, id: i64) -> Result<User> {
        self.scopes.require_unrestricted_admin(principal).await?;
        reject_self(principal, id)?;

        let user = self
            .users
            .find_user(id)
            .await?
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let updated = self.users.set_user_active(id, !user.is_active).await?;
        info!(
            "User {} is now {}",
            id,
            if updated.is_active { "active" } else { "inactive" }
        );
        Ok(updated)
    }

    /// Edit name, email or role of a live account.
    ///
    /// Superadmins may assign any role. Other admins may only hand out the
    /// admin and citizen roles, and cannot edit superadmin accounts.
    pub async fn update(&self, principal: &Principal, id: i64, update: UserUpdate) -> Result<User> {
        self.scopes.require_unrestricted_admin(principal).await?;

        let user = self
            .users
            .find_user(id)
            .await?
            .filter(|u| u.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        if user.role == Role::Superadmin && !principal.is_superadmin() {
            return Err(AppError::Forbidden(
                "Only a superadmin may edit a superadmin account".to_string(),
            ));
        }

        let role = match update.role {
            Some(role) if role != user.role => {
                reject_self(principal, id)?;
                if !principal.is_superadmin() && !matches!(role, Role::Admin | Role::Citizen) {
                    return Err(AppError::Forbidden(format!(
                        "Only a superadmin may assign the {} role",
                        role.as_str()
                    )));
                }
                role
            }
            _ => user.role,
        };

        let name = match update.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::Validation("Name must not be empty".to_string()))
            }
            Some(name) => name.trim().to_string(),
            None => user.name,
        };
        let email = update
            .email
            .map(|e| e.trim().to_lowercase())
            .unwrap_or(user.email);

        let updated = self
            .users
            .update_user(id, UserChanges { name, email, role })
            .await?;
        info!("User {} updated by {}", id, principal.user_id);
        Ok(updated)
    }

    /// The live admin that owns `category_id`
    pub async fn category_admin(&self, category_id: i64) -> Result<User> {
        let category = self
            .categories
            .find_category(category_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", category_id)))?;

        let no_admin = || AppError::NotFound(format!("Category {} has no admin", category_id));
        let owner = category.user_id.ok_or_else(no_admin)?;
        self.users
            .find_user(owner)
            .await?
            .filter(|u| u.deleted_at.is_none() && u.role.is_admin_tier())
            .ok_or_else(no_admin)
    }
}

fn reject_self(principal: &Principal, id: i64) -> Result<()> {
    if principal.user_id == id {
        return Err(AppError::BadRequest(
            "You cannot change your own account here".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::EmptyScopePolicy;
    use crate::features::auth::model::Role;
    use crate::features::categories::models::CategoryInput;
    use crate::modules::store::{CategoryStore, MemoryStore, ReportStore, UnitOfWork};
    use crate::shared::test_helpers::{new_report, principal, seed_user};

    fn service(store: &Arc<MemoryStore>) -> UserService {
        let scopes = Arc::new(ScopeResolver::new(
            store.clone(),
            EmptyScopePolicy::Unrestricted,
        ));
        UserService::new(store.clone(), scopes)
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore_user() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let root = seed_user(&store, Role::Superadmin).await;
        let target = seed_user(&store, Role::Citizen).await;
        let actor = principal(root.id, Role::Superadmin);

        service.soft_delete(&actor, target.id).await.unwrap();
        let listed = service.list(&actor, ListMode::Active).await.unwrap();
        assert!(listed.iter().all(|u| u.id != target.id));

        let fetched = service.get(&actor, target.id).await.unwrap();
        assert!(fetched.deleted_at.is_some());

        tokio_test::assert_ok!(service.restore(&actor, target.id).await);
        tokio_test::assert_err!(service.restore(&actor, target.id).await);
        let stats = service.stats(&actor).await.unwrap();
        assert_eq!(stats.ledger.total, 2);
        assert_eq!(stats.ledger.active, 2);
        assert_eq!(stats.ledger.deleted, 0);
    }

    #[tokio::test]
    async fn test_only_superadmin_hard_deletes() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let admin = seed_user(&store, Role::Admin).await;
        let root = seed_user(&store, Role::Superadmin).await;
        let target = seed_user(&store, Role::Citizen).await;

        let result = service
            .hard_delete(&principal(admin.id, Role::Admin), target.id)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        service
            .hard_delete(&principal(root.id, Role::Superadmin), target.id)
            .await
            .unwrap();
        let result = service
            .get(&principal(root.id, Role::Superadmin), target.id)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_user_ledger_counts_hold_through_purge() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let root = seed_user(&store, Role::Superadmin).await;
        let first = seed_user(&store, Role::Citizen).await;
        let second = seed_user(&store, Role::Citizen).await;
        let actor = principal(root.id, Role::Superadmin);

        let assert_balanced = |stats: &UserStatsDto, total: i64, deleted: i64| {
            assert_eq!(stats.ledger.total, total);
            assert_eq!(stats.ledger.deleted, deleted);
            assert_eq!(stats.ledger.total, stats.ledger.active + stats.ledger.deleted);
        };

        assert_balanced(&service.stats(&actor).await.unwrap(), 3, 0);

        service.soft_delete(&actor, first.id).await.unwrap();
        assert_balanced(&service.stats(&actor).await.unwrap(), 3, 1);

        service.soft_delete(&actor, second.id).await.unwrap();
        service.restore(&actor, second.id).await.unwrap();
        assert_balanced(&service.stats(&actor).await.unwrap(), 3, 1);

        service.hard_delete(&actor, first.id).await.unwrap();
        assert_balanced(&service.stats(&actor).await.unwrap(), 2, 0);

        let result = service.restore(&actor, first.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        service.hard_delete(&actor, second.id).await.unwrap();
        let result = service.restore(&actor, second.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_balanced(&service.stats(&actor).await.unwrap(), 1, 0);
    }

    #[tokio::test]
    async fn test_update_edits_name_and_email() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let admin = seed_user(&store, Role::Admin).await;
        let target = seed_user(&store, Role::Citizen).await;
        let other = seed_user(&store, Role::Citizen).await;
        let actor = principal(admin.id, Role::Admin);

        let user = service
            .update(
                &actor,
                target.id,
                UserUpdate {
                    name: Some("  Rina Wulandari ".to_string()),
                    email: Some("Rina@Example.com".to_string()),
                    role: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(user.name, "Rina Wulandari");
        assert_eq!(user.email, "rina@example.com");
        assert_eq!(user.role, Role::Citizen);

        let result = service
            .update(
                &actor,
                target.id,
                UserUpdate {
                    email: Some(other.email.clone()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let result = service
            .update(
                &actor,
                target.id,
                UserUpdate {
                    name: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_role_assignment_rules() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let admin = seed_user(&store, Role::Admin).await;
        let root = seed_user(&store, Role::Superadmin).await;
        let target = seed_user(&store, Role::Citizen).await;
        let as_admin = principal(admin.id, Role::Admin);
        let as_root = principal(root.id, Role::Superadmin);
        let with_role = |role| UserUpdate {
            role: Some(role),
            ..Default::default()
        };

        let user = service
            .update(&as_admin, target.id, with_role(Role::Admin))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);

        for role in [Role::CategoryAdmin, Role::Superadmin] {
            let result = service.update(&as_admin, target.id, with_role(role)).await;
            assert!(matches!(result, Err(AppError::Forbidden(_))));
        }
        let result = service.update(&as_admin, root.id, UserUpdate::default()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
        let result = service
            .update(&as_admin, admin.id, with_role(Role::Citizen))
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let user = service
            .update(&as_root, target.id, with_role(Role::CategoryAdmin))
            .await
            .unwrap();
        assert_eq!(user.role, Role::CategoryAdmin);
    }

    #[tokio::test]
    async fn test_category_admin_lookup() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let owner = seed_user(&store, Role::CategoryAdmin).await;
        let owned = store
            .insert_category(CategoryInput {
                name: "Sampah".to_string(),
                user_id: Some(owner.id),
            })
            .await
            .unwrap();
        let orphan = store
            .insert_category(CategoryInput {
                name: "Banjir".to_string(),
                user_id: None,
            })
            .await
            .unwrap();

        let admin = service.category_admin(owned.id).await.unwrap();
        assert_eq!(admin.id, owner.id);

        let result = service.category_admin(orphan.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        let result = service.category_admin(9999).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_hard_delete_of_report_author_conflicts() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let root = seed_user(&store, Role::Superadmin).await;
        let author = seed_user(&store, Role::Citizen).await;

        let mut uow = store.begin().await.unwrap();
        uow.insert_report(new_report(author.id, "YK2401013333"))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let result = service
            .hard_delete(&principal(root.id, Role::Superadmin), author.id)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_scoped_admin_cannot_manage_users() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let admin = seed_user(&store, Role::CategoryAdmin).await;
        let target = seed_user(&store, Role::Citizen).await;
        store
            .insert_category(CategoryInput {
                name: "Jalan".to_string(),
                user_id: Some(admin.id),
            })
            .await
            .unwrap();

        let result = service
            .soft_delete(&principal(admin.id, Role::CategoryAdmin), target.id)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_toggle_active_flips_flag() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let root = seed_user(&store, Role::Superadmin).await;
        let target = seed_user(&store, Role::Citizen).await;
        let actor = principal(root.id, Role::Superadmin);

        let user = service.toggle_active(&actor, target.id).await.unwrap();
        assert!(!user.is_active);
        let user = service.toggle_active(&actor, target.id).await.unwrap();
        assert!(user.is_active);

        let result = service.toggle_active(&actor, root.id).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_requires_superadmin() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let new_user = NewUser {
            name: "Siti".to_string(),
            email: "siti@example.com".to_string(),
            role: Role::Admin,
        };

        let result = service
            .create(&principal(1, Role::Admin), new_user.clone())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let user = service
            .create(&principal(1, Role::Superadmin), new_user.clone())
            .await
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(user.is_active);

        let result = service
            .create(&principal(1, Role::Superadmin), new_user)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
