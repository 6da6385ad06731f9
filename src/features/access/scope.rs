//! Access scope resolution.
//!
//! A scope is the set of reports a principal may see or act on. It is
//! recomputed from category ownership in the store on every call, so a
//! change of ownership takes effect on the very next request.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::{Principal, Role};
use crate::features::reports::models::Report;
use crate::modules::store::CategoryStore;

/// Report visibility filter for one principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Unrestricted,
    /// Reports whose category is in the set. Uncategorised reports are excluded.
    Categories(BTreeSet<i64>),
    /// Reports authored by this user
    Author(i64),
    /// Matches no report
    Nothing,
}

impl Scope {
    pub fn permits(&self, report: &Report) -> bool {
        self.permits_parts(report.user_id, report.category_id)
    }

    pub fn permits_parts(&self, author_id: i64, category_id: Option<i64>) -> bool {
        match self {
            Scope::Unrestricted => true,
            Scope::Categories(ids) => category_id.is_some_and(|id| ids.contains(&id)),
            Scope::Author(user_id) => *user_id == author_id,
            Scope::Nothing => false,
        }
    }

    pub fn permits_category(&self, category_id: Option<i64>) -> bool {
        match self {
            Scope::Unrestricted => true,
            Scope::Categories(ids) => category_id.is_some_and(|id| ids.contains(&id)),
            Scope::Author(_) | Scope::Nothing => false,
        }
    }
}

/// What an admin who owns no categories may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyScopePolicy {
    /// Admin without categories acts as a global admin
    Unrestricted,
    /// Admin without categories sees nothing until a category is assigned
    Nothing,
}

impl FromStr for EmptyScopePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unrestricted" => Ok(EmptyScopePolicy::Unrestricted),
            "nothing" | "deny" => Ok(EmptyScopePolicy::Nothing),
            other => Err(format!(
                "SCOPE_EMPTY_POLICY must be 'unrestricted' or 'nothing', got '{}'",
                other
            )),
        }
    }
}

pub struct ScopeResolver {
    categories: Arc<dyn CategoryStore>,
    empty_policy: EmptyScopePolicy,
}

impl ScopeResolver {
    pub fn new(categories: Arc<dyn CategoryStore>, empty_policy: EmptyScopePolicy) -> Self {
        Self {
            categories,
            empty_policy,
        }
    }

    pub async fn compute_scope(&self, principal: &Principal) -> Result<Scope> {
        match principal.role {
            Role::Superadmin => Ok(Scope::Unrestricted),
            Role::Citizen => Ok(Scope::Author(principal.user_id)),
            Role::Admin | Role::CategoryAdmin => {
                let owned = self
                    .categories
                    .owned_category_ids(principal.user_id)
                    .await?;

                if !owned.is_empty() {
                    return Ok(Scope::Categories(owned));
                }

                tracing::debug!(
                    "Admin {} owns no categories, applying {:?} policy",
                    principal.user_id,
                    self.empty_policy
                );
                Ok(match self.empty_policy {
                    EmptyScopePolicy::Unrestricted => Scope::Unrestricted,
                    EmptyScopePolicy::Nothing => Scope::Nothing,
                })
            }
        }
    }

    /// Scope of an admin-tier principal. Citizens are rejected.
    pub async fn admin_scope(&self, principal: &Principal) -> Result<Scope> {
        if !principal.is_admin_tier() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        self.compute_scope(principal).await
    }

    /// Require an admin whose scope covers the given report
    pub async fn authorize_report(&self, principal: &Principal, report: &Report) -> Result<Scope> {
        let scope = self.admin_scope(principal).await?;
        if !scope.permits(report) {
            return Err(AppError::Forbidden(format!(
                "Report {} is outside your categories",
                report.id
            )));
        }
        Ok(scope)
    }

    /// Superadmin, or an admin whose scope resolves to unrestricted
    pub async fn is_unrestricted_admin(&self, principal: &Principal) -> Result<bool> {
        if principal.is_superadmin() {
            return Ok(true);
        }
        if !principal.is_admin_tier() {
            return Ok(false);
        }
        Ok(self.compute_scope(principal).await? == Scope::Unrestricted)
    }

    pub async fn require_unrestricted_admin(&self, principal: &Principal) -> Result<()> {
        if self.is_unrestricted_admin(principal).await? {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only a superadmin or an admin without assigned categories may do this"
                    .to_string(),
            ))
        }
    }
}
