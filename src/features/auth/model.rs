use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;

/// Account role, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "user")]
    Citizen,
    Admin,
    CategoryAdmin,
    #[serde(alias = "super_admin")]
    Superadmin,
}

impl Role {
    /// Admin, category admin and superadmin all work the triage queue
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Role::Admin | Role::CategoryAdmin | Role::Superadmin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Admin => "admin",
            Role::CategoryAdmin => "category_admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified caller identity, built once from the bearer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
    /// Categories asserted by the identity provider. Informational only;
    /// access scope is always recomputed from category ownership in the store.
    #[serde(default)]
    pub category_ids: Vec<i64>,
    pub is_active: bool,
}

impl Principal {
    pub fn is_superadmin(&self) -> bool {
        self.role == Role::Superadmin
    }

    pub fn is_admin_tier(&self) -> bool {
        self.role.is_admin_tier()
    }
}

/// Claims carried by the HS256 principal token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalClaims {
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub exp: u64,
}

fn default_active() -> bool {
    true
}
