use std::sync::Arc;

use tracing::info;

use crate::core::error::{AppError, Result};
use crate::features::access::ScopeResolver;
use crate::features::auth::model::Principal;
use crate::features::categories::models::{Category, CategoryInput};
use crate::features::users::models::User;
use crate::modules::store::{CategoryStore, UserStore};

/// Service for category operations
///
/// Reading is public. Writes are limited to unrestricted admins, since a
/// category's owner decides which admin can triage its reports.
pub struct CategoryService {
    categories: Arc<dyn CategoryStore>,
    users: Arc<dyn UserStore>,
    scopes: Arc<ScopeResolver>,
}

impl CategoryService {
    pub fn new<S>(store: Arc<S>, scopes: Arc<ScopeResolver>) -> Self
    where
        S: CategoryStore + UserStore + 'static,
    {
        Self {
            categories: store.clone(),
            users: store,
            scopes,
        }
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        self.categories.list_categories().await
    }

    pub async fn get(&self, id: i64) -> Result<Category> {
        self.categories
            .find_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn create(&self, principal: &Principal, input: CategoryInput) -> Result<Category> {
        self.scopes.require_unrestricted_admin(principal).await?;
        self.check_owner(input.user_id).await?;

        let category = self.categories.insert_category(input).await?;
        info!("Category {} '{}' created", category.id, category.name);
        Ok(category)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        input: CategoryInput,
    ) -> Result<Category> {
        self.scopes.require_unrestricted_admin(principal).await?;
        self.check_owner(input.user_id).await?;

        let category = self.categories.update_category(id, input).await?;
        info!("Category {} updated", id);
        Ok(category)
    }

    /// Reports in the category become uncategorised
    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<()> {
        self.scopes.require_unrestricted_admin(principal).await?;
        self.categories.delete_category(id).await?;
        info!("Category {} deleted", id);
        Ok(())
    }

    pub async fn list_admins(&self) -> Result<Vec<User>> {
        self.users.list_admins().await
    }

    async fn check_owner(&self, owner: Option<i64>) -> Result<()> {
        let Some(owner) = owner else {
            return Ok(());
        };

        let user = self
            .users
            .find_user(owner)
            .await?
            .filter(|u| u.deleted_at.is_none());
        match user {
            Some(user) if user.role.is_admin_tier() => Ok(()),
            Some(_) => Err(AppError::Validation(format!(
                "User {} is not an admin and cannot own a category",
                owner
            ))),
            None => Err(AppError::Validation(format!("User {} does not exist", owner))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access::{EmptyScopePolicy, Scope};
    use crate::features::auth::model::Role;
    use crate::modules::store::{MemoryStore, ReportStore, UnitOfWork};
    use crate::shared::test_helpers::{new_report, principal, seed_user};

    fn service(store: &Arc<MemoryStore>) -> (CategoryService, Arc<ScopeResolver>) {
        let scopes = Arc::new(ScopeResolver::new(
            store.clone(),
            EmptyScopePolicy::Unrestricted,
        ));
        (CategoryService::new(store.clone(), scopes.clone()), scopes)
    }

    fn input(name: &str, user_id: Option<i64>) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            user_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(&store);
        let root = principal(1, Role::Superadmin);

        service.create(&root, input("Jalan", None)).await.unwrap();
        let result = service.create(&root, input("Jalan", None)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_assigning_owner_narrows_scope() {
        let store = Arc::new(MemoryStore::new());
        let (service, scopes) = service(&store);
        let admin = seed_user(&store, Role::Admin).await;
        let admin_principal = principal(admin.id, Role::Admin);

        let category = service
            .create(&admin_principal, input("Drainase", Some(admin.id)))
            .await
            .unwrap();
        assert!(matches!(
            scopes.compute_scope(&admin_principal).await.unwrap(),
            Scope::Categories(_)
        ));

        // Now scoped, the same admin can no longer manage categories
        let result = service.delete(&admin_principal, category.id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_citizen_cannot_own_category() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(&store);
        let citizen = seed_user(&store, Role::Citizen).await;

        let result = service
            .create(&principal(1, Role::Superadmin), input("Air", Some(citizen.id)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_clears_report_category() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(&store);
        let root = principal(1, Role::Superadmin);
        let citizen = seed_user(&store, Role::Citizen).await;
        let category = service.create(&root, input("Sampah", None)).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let mut new = new_report(citizen.id, "YK2401014444");
        new.category_id = Some(category.id);
        let report = uow.insert_report(new).await.unwrap();
        uow.commit().await.unwrap();

        service.delete(&root, category.id).await.unwrap();
        let report = store.find_report(report.id).await.unwrap().unwrap();
        assert_eq!(report.category_id, None);

        let result = service.get(category.id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
